use std::fmt::Display;
use std::ops::Index;
use std::rc::Rc;

use serde::Deserialize;
use serde::Serialize;

use crate::Effect;
use crate::EffectParameter;
use crate::SnipError;
use crate::SnipResult;

/// Handle to a node stored in a [`MatchTree`].
///
/// Ids are only meaningful for the tree that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
	pub fn index(self) -> usize {
		self.0
	}
}

impl Display for NodeId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// How a matcher classified a candidate match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MatchType {
	/// The default classification.
	#[default]
	Normal,
	/// Every query token was matched by the effect's pattern.
	Exact,
	/// Only some of the query tokens were matched.
	Partial,
}

impl MatchType {
	/// Decode a classification sent as an ordinal.
	pub fn from_index(index: usize) -> Option<Self> {
		match index {
			0 => Some(Self::Normal),
			1 => Some(Self::Exact),
			2 => Some(Self::Partial),
			_ => None,
		}
	}
}

/// A node in a [`MatchTree`]: either an effect application or an argument
/// leaf.
#[derive(Debug, Clone)]
pub struct MatchNode {
	parent: Option<NodeId>,
	match_type: MatchType,
	kind: MatchNodeKind,
}

impl MatchNode {
	pub fn parent(&self) -> Option<NodeId> {
		self.parent
	}

	pub fn match_type(&self) -> MatchType {
		self.match_type
	}

	pub fn kind(&self) -> &MatchNodeKind {
		&self.kind
	}

	pub fn as_effect(&self) -> Option<&EffectMatchNode> {
		match &self.kind {
			MatchNodeKind::Effect(node) => Some(node),
			MatchNodeKind::Argument(_) => None,
		}
	}

	pub fn as_argument(&self) -> Option<&ArgumentMatchNode> {
		match &self.kind {
			MatchNodeKind::Argument(node) => Some(node),
			MatchNodeKind::Effect(_) => None,
		}
	}
}

#[derive(Debug, Clone)]
pub enum MatchNodeKind {
	Effect(EffectMatchNode),
	Argument(ArgumentMatchNode),
}

/// An application of an [`Effect`] with one child per effect parameter.
///
/// Besides its children the node owns a ghost child: an unbound argument
/// leaf that completion front ends use to offer one more argument. The ghost
/// child is never part of [`children`](Self::children) and is ignored by
/// child counts, equality, completeness and emptiness.
#[derive(Debug, Clone)]
pub struct EffectMatchNode {
	effect: Rc<Effect>,
	pattern: String,
	children: Vec<NodeId>,
	ghost_child: NodeId,
}

impl EffectMatchNode {
	pub fn effect(&self) -> &Rc<Effect> {
		&self.effect
	}

	/// The search pattern of the effect that produced this match.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// The live child list, in effect parameter order.
	pub fn children(&self) -> &[NodeId] {
		&self.children
	}

	pub fn num_children(&self) -> usize {
		self.children.len()
	}

	pub fn child(&self, index: usize) -> Option<NodeId> {
		self.children.get(index).copied()
	}

	/// The child bound to the first effect parameter named `name`.
	pub fn child_by_name(&self, name: &str) -> Option<NodeId> {
		let index = self.effect.parameter_index(name)?;
		self.child(index)
	}

	pub fn ghost_child(&self) -> NodeId {
		self.ghost_child
	}
}

/// A leaf holding the literal text typed for one effect parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentMatchNode {
	argument: Option<String>,
	parameter: Option<EffectParameter>,
}

impl ArgumentMatchNode {
	pub fn new(parameter: Option<EffectParameter>, argument: Option<String>) -> Self {
		Self {
			argument,
			parameter,
		}
	}

	pub fn argument(&self) -> Option<&str> {
		self.argument.as_deref()
	}

	pub fn parameter(&self) -> Option<&EffectParameter> {
		self.parameter.as_ref()
	}

	pub fn set_argument(&mut self, argument: Option<String>) {
		self.argument = argument;
	}

	/// True when the argument is present and not empty.
	pub fn is_bound(&self) -> bool {
		self.argument.as_deref().is_some_and(|text| !text.is_empty())
	}
}

/// Arena holding one or more match trees.
///
/// Nodes own their children through [`NodeId`]s and point back to their
/// parent with a plain id, so parent links never own anything. Nodes are
/// never removed; a tree discarded by the caller simply stays unreachable
/// until the arena itself is dropped at the end of the matching session.
///
/// ```rust
/// use std::rc::Rc;
///
/// use snipmatch_core::Effect;
/// use snipmatch_core::EffectParameter;
/// use snipmatch_core::MatchTree;
///
/// let effect = Rc::new(
/// 	Effect::new("print")
/// 		.with_parameter(EffectParameter::new("value", "expr", ""))
/// 		.with_code("println!(\"{}\", ${value});"),
/// );
///
/// let mut tree = MatchTree::new();
/// let root = tree.add_effect_with_parameters(effect, "print $value");
/// assert!(tree.is_empty(root));
///
/// let child = tree[root].as_effect().and_then(|node| node.child(0)).unwrap();
/// tree.set_argument(child, Some("answer".into()));
/// assert!(tree.is_complete(root));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MatchTree {
	nodes: Vec<MatchNode>,
}

impl MatchTree {
	pub fn new() -> Self {
		Self::default()
	}

	/// Total number of nodes ever created in this arena, ghost children
	/// included.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn get(&self, id: NodeId) -> Option<&MatchNode> {
		self.nodes.get(id.0)
	}

	/// Create a detached argument leaf.
	pub fn add_argument(
		&mut self,
		parameter: Option<EffectParameter>,
		argument: Option<String>,
	) -> NodeId {
		self.push(None, MatchNodeKind::Argument(ArgumentMatchNode::new(parameter, argument)))
	}

	/// Create an effect match over existing detached nodes and adopt them as
	/// its children.
	///
	/// The number of children must equal the effect's parameter count and
	/// every child must still be detached.
	pub fn add_effect(
		&mut self,
		effect: Rc<Effect>,
		pattern: impl Into<String>,
		children: Vec<NodeId>,
	) -> SnipResult<NodeId> {
		if children.len() != effect.num_parameters() {
			return Err(SnipError::ChildCountMismatch {
				effect: effect.id().to_string(),
				expected: effect.num_parameters(),
				got: children.len(),
			});
		}

		for (position, child) in children.iter().enumerate() {
			let attached = self[*child].parent.is_some() || children[..position].contains(child);
			if attached {
				return Err(SnipError::NodeAlreadyAttached(*child));
			}
		}

		let id = NodeId(self.nodes.len());
		let ghost_child = NodeId(id.0 + 1);

		for child in &children {
			self.nodes[child.0].parent = Some(id);
		}

		self.nodes.push(MatchNode {
			parent: None,
			match_type: MatchType::default(),
			kind: MatchNodeKind::Effect(EffectMatchNode {
				effect,
				pattern: pattern.into(),
				children,
				ghost_child,
			}),
		});
		self.push(Some(id), MatchNodeKind::Argument(ArgumentMatchNode::default()));

		Ok(id)
	}

	/// Create an effect match with one unbound argument leaf per parameter.
	pub fn add_effect_with_parameters(
		&mut self,
		effect: Rc<Effect>,
		pattern: impl Into<String>,
	) -> NodeId {
		let children = effect
			.parameters()
			.iter()
			.map(|param| self.add_argument(Some(param.clone()), None))
			.collect();

		match self.add_effect(effect, pattern, children) {
			Ok(id) => id,
			Err(e) => unreachable!("fresh argument leaves are always attachable: {e}"),
		}
	}

	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self[id].parent
	}

	/// Walk parent links up to the node that has none.
	pub fn root(&self, id: NodeId) -> NodeId {
		let mut current = id;
		while let Some(parent) = self[current].parent {
			current = parent;
		}
		current
	}

	pub fn match_type(&self, id: NodeId) -> MatchType {
		self[id].match_type
	}

	pub fn set_match_type(&mut self, id: NodeId, match_type: MatchType) {
		self.node_mut(id).match_type = match_type;
	}

	pub fn effect_node(&self, id: NodeId) -> Option<&EffectMatchNode> {
		self[id].as_effect()
	}

	pub fn argument_node(&self, id: NodeId) -> Option<&ArgumentMatchNode> {
		self[id].as_argument()
	}

	pub fn argument_node_mut(&mut self, id: NodeId) -> Option<&mut ArgumentMatchNode> {
		match &mut self.node_mut(id).kind {
			MatchNodeKind::Argument(node) => Some(node),
			MatchNodeKind::Effect(_) => None,
		}
	}

	/// Rebind the text of an argument leaf in place. Returns `false` when
	/// `id` is an effect match.
	pub fn set_argument(&mut self, id: NodeId, argument: Option<String>) -> bool {
		match self.argument_node_mut(id) {
			Some(node) => {
				node.set_argument(argument);
				true
			}
			None => false,
		}
	}

	/// True when every argument leaf reachable from `id` has non-empty text.
	pub fn is_complete(&self, id: NodeId) -> bool {
		match &self[id].kind {
			MatchNodeKind::Argument(node) => node.is_bound(),
			MatchNodeKind::Effect(node) => {
				node.children.iter().all(|child| self.is_complete(*child))
			}
		}
	}

	/// True when every argument leaf reachable from `id` is absent or empty.
	pub fn is_empty(&self, id: NodeId) -> bool {
		match &self[id].kind {
			MatchNodeKind::Argument(node) => !node.is_bound(),
			MatchNodeKind::Effect(node) => node.children.iter().all(|child| self.is_empty(*child)),
		}
	}

	/// Structural equality between `id` in this tree and `other_id` in
	/// `other`, which may be the same tree.
	///
	/// Effect matches must share the same `Rc<Effect>` instance and have
	/// pairwise equal children in order. Argument leaves compare their
	/// parameter and text by value.
	pub fn equals(&self, id: NodeId, other: &MatchTree, other_id: NodeId) -> bool {
		match (&self[id].kind, &other[other_id].kind) {
			(MatchNodeKind::Effect(left), MatchNodeKind::Effect(right)) => {
				Rc::ptr_eq(&left.effect, &right.effect)
					&& left.children.len() == right.children.len()
					&& left
						.children
						.iter()
						.zip(&right.children)
						.all(|(a, b)| self.equals(*a, other, *b))
			}
			(MatchNodeKind::Argument(left), MatchNodeKind::Argument(right)) => left == right,
			_ => false,
		}
	}

	/// Deep-copy the subtree rooted at `id` into a new detached tree.
	///
	/// Children are copied first and then adopted by the new effect node, so
	/// every parent link of the copy points inside the copy. The copy gets a
	/// fresh ghost child; the state of the original ghost is not carried over.
	pub fn clone_node(&mut self, id: NodeId) -> NodeId {
		let match_type = self[id].match_type;
		let copy = match &self[id].kind {
			MatchNodeKind::Argument(node) => {
				let node = node.clone();
				self.push(None, MatchNodeKind::Argument(node))
			}
			MatchNodeKind::Effect(node) => {
				let effect = Rc::clone(&node.effect);
				let pattern = node.pattern.clone();
				let children = node.children.clone();
				let copies = children.into_iter().map(|child| self.clone_node(child)).collect();

				match self.add_effect(effect, pattern, copies) {
					Ok(copy) => copy,
					Err(e) => unreachable!("cloned children are always attachable: {e}"),
				}
			}
		};

		self.node_mut(copy).match_type = match_type;
		copy
	}

	/// Argument leaves below `id` in parameter order, ghost children excluded.
	pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
		let mut leaves = Vec::new();
		self.collect_leaves(id, &mut leaves);
		leaves
	}

	fn collect_leaves(&self, id: NodeId, leaves: &mut Vec<NodeId>) {
		match &self[id].kind {
			MatchNodeKind::Argument(_) => leaves.push(id),
			MatchNodeKind::Effect(node) => {
				for child in &node.children {
					self.collect_leaves(*child, leaves);
				}
			}
		}
	}

	fn push(&mut self, parent: Option<NodeId>, kind: MatchNodeKind) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(MatchNode {
			parent,
			match_type: MatchType::default(),
			kind,
		});
		id
	}

	fn node_mut(&mut self, id: NodeId) -> &mut MatchNode {
		&mut self.nodes[id.0]
	}
}

impl Index<NodeId> for MatchTree {
	type Output = MatchNode;

	fn index(&self, id: NodeId) -> &Self::Output {
		&self.nodes[id.0]
	}
}

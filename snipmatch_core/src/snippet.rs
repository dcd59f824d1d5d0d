use std::collections::HashMap;
use std::rc::Rc;

use derive_more::Deref;
use derive_more::DerefMut;
use indexmap::IndexMap;

use crate::Effect;
use crate::FormulaSnippetNode;
use crate::MatchEnvironment;
use crate::MatchTree;
use crate::NodeId;
use crate::SnipError;
use crate::SnipResult;
use crate::SnippetNode;
use crate::TextSnippetNode;
use crate::parse_snippet_nodes;

/// Flat name to value bindings visible to formulas during one evaluation.
///
/// Seeded with the effect's parameter names bound to the evaluated arguments.
/// A formula that captures a new variable inserts it here, so it is visible
/// to every later formula of the same walk and to none before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct Variables(
	#[deref]
	#[deref_mut]
	IndexMap<String, String>,
);

impl Variables {
	pub fn new() -> Self {
		Self::default()
	}

	/// Look up a binding by name.
	pub fn value(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}
}

impl FromIterator<(String, String)> for Variables {
	fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// Context specific hooks for a [`SnippetMatchEnvironment`].
///
/// Everything a [`MatchEnvironment`] needs besides effect evaluation, plus
/// the two per-node hooks the snippet walk calls into.
pub trait SnippetEvaluator {
	fn name(&self) -> &str;

	fn friendly_name(&self) -> &str {
		self.name()
	}

	fn major_types(&self) -> &[&str] {
		&[]
	}

	fn reset(&mut self);

	/// Called before each top level evaluation.
	fn begin_evaluation(&mut self) {}

	fn test_match(&self, tree: &MatchTree, node: NodeId) -> bool;

	fn apply_result(&mut self, result: String, effect: Option<&Effect>) -> SnipResult<()>;

	fn argument_completions(&mut self, tree: &MatchTree, node: NodeId) -> Vec<String>;

	fn query_token_interpretation(&self, token: &str) -> String;

	/// Bind a formula to its concrete value.
	///
	/// `effect_node` is the effect match currently being evaluated.
	fn evaluate_formula_snippet_node(
		&mut self,
		node: &FormulaSnippetNode,
		variables: &Variables,
		tree: &MatchTree,
		effect_node: NodeId,
	) -> SnipResult<String>;

	/// The output for a literal text node. Defaults to the text itself.
	fn evaluate_text_snippet_node(
		&mut self,
		node: &TextSnippetNode,
		_variables: &Variables,
		_tree: &MatchTree,
		_effect_node: NodeId,
	) -> SnipResult<String> {
		Ok(node.text().to_string())
	}
}

/// A [`MatchEnvironment`] that synthesizes text from effect code.
///
/// Parsed snippet nodes are cached per [`Effect::id`] for the life of the
/// environment; [`reset`](MatchEnvironment::reset) leaves the cache intact.
/// Two distinct effects sharing an id therefore share one cache entry. Ids
/// are assumed unique and effects immutable once shared.
#[derive(Debug)]
pub struct SnippetMatchEnvironment<E> {
	evaluator: E,
	cache: HashMap<String, Rc<[SnippetNode]>>,
}

impl<E: SnippetEvaluator> SnippetMatchEnvironment<E> {
	pub fn new(evaluator: E) -> Self {
		Self {
			evaluator,
			cache: HashMap::new(),
		}
	}

	pub fn evaluator(&self) -> &E {
		&self.evaluator
	}

	pub fn evaluator_mut(&mut self) -> &mut E {
		&mut self.evaluator
	}

	pub fn into_evaluator(self) -> E {
		self.evaluator
	}

	/// Number of effects whose code has been parsed and cached.
	pub fn cached_effects(&self) -> usize {
		self.cache.len()
	}

	pub fn is_cached(&self, effect_id: &str) -> bool {
		self.cache.contains_key(effect_id)
	}

	/// Fetch the parsed nodes for `effect`, parsing and caching them on the
	/// first request. Parse failures are returned and not cached.
	pub fn snippet_nodes(&mut self, effect: &Rc<Effect>) -> SnipResult<Rc<[SnippetNode]>> {
		if let Some(nodes) = self.cache.get(effect.id()) {
			tracing::trace!(effect = effect.id(), "snippet cache hit");
			return Ok(Rc::clone(nodes));
		}

		let nodes: Rc<[SnippetNode]> = parse_snippet_nodes(effect)?.into();
		tracing::debug!(effect = effect.id(), nodes = nodes.len(), "parsed and cached effect code");
		self.cache.insert(effect.id().to_string(), Rc::clone(&nodes));

		Ok(nodes)
	}
}

impl<E: SnippetEvaluator> MatchEnvironment for SnippetMatchEnvironment<E> {
	fn name(&self) -> &str {
		self.evaluator.name()
	}

	fn friendly_name(&self) -> &str {
		self.evaluator.friendly_name()
	}

	fn major_types(&self) -> &[&str] {
		self.evaluator.major_types()
	}

	fn reset(&mut self) {
		tracing::debug!(environment = self.evaluator.name(), "resetting environment");
		self.evaluator.reset();
	}

	fn begin_evaluation(&mut self) {
		self.evaluator.begin_evaluation();
	}

	fn test_match(&self, tree: &MatchTree, node: NodeId) -> bool {
		self.evaluator.test_match(tree, node)
	}

	fn evaluate_effect(
		&mut self,
		tree: &MatchTree,
		node: NodeId,
		args: Vec<String>,
	) -> SnipResult<String> {
		let effect = tree
			.effect_node(node)
			.map(|effect_node| Rc::clone(effect_node.effect()))
			.ok_or(SnipError::NotAnEffectNode(node))?;
		tracing::trace!(effect = effect.id(), args = args.len(), "evaluating effect");

		let mut variables: Variables = effect
			.parameters()
			.iter()
			.map(|param| param.name().to_string())
			.zip(args)
			.collect();

		let nodes = self.snippet_nodes(&effect)?;
		let mut output = String::new();

		for snippet_node in nodes.iter() {
			match snippet_node {
				SnippetNode::Text(text) => {
					let value = self
						.evaluator
						.evaluate_text_snippet_node(text, &variables, tree, node)?;
					output.push_str(&value);
				}
				SnippetNode::Formula(formula) => {
					let value = self
						.evaluator
						.evaluate_formula_snippet_node(formula, &variables, tree, node)?;
					output.push_str(&value);

					if let Some(name) = formula.new_variable() {
						variables.insert(name.to_string(), value);
					}
				}
			}
		}

		Ok(output.trim().to_string())
	}

	fn apply_result(&mut self, result: String, effect: Option<&Effect>) -> SnipResult<()> {
		self.evaluator.apply_result(result, effect)
	}

	fn argument_completions(&mut self, tree: &MatchTree, node: NodeId) -> Vec<String> {
		self.evaluator.argument_completions(tree, node)
	}

	fn query_token_interpretation(&self, token: &str) -> String {
		self.evaluator.query_token_interpretation(token)
	}
}

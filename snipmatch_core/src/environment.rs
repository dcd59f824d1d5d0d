use std::collections::HashMap;
use std::rc::Rc;

use crate::Effect;
use crate::MatchNodeKind;
use crate::MatchTree;
use crate::NodeId;
use crate::SnipResult;

/// Prefix rendered in front of argument text when evaluating an overview.
pub const PLACEHOLDER_PREFIX: &str = "$";

/// A session-scoped context that validates, evaluates and applies matches.
///
/// Implementors supply the context specific hooks (`test_match`,
/// `evaluate_effect`, `apply_result`, `argument_completions` and
/// `query_token_interpretation`). Query tokenization, recursive evaluation and
/// the evaluate-then-apply flow are provided.
///
/// One environment serves one matching session. [`reset`](Self::reset)
/// discards anything applied so far and may be called at any point.
pub trait MatchEnvironment {
	/// Unique environment name. Effects whose
	/// [`environment_name`](Effect::environment_name) is set target
	/// environments by this name.
	fn name(&self) -> &str;

	/// Human readable name.
	fn friendly_name(&self) -> &str {
		self.name()
	}

	/// The effect major types this environment understands.
	fn major_types(&self) -> &[&str] {
		&[]
	}

	/// Discard applied changes and return to the initial state.
	fn reset(&mut self);

	/// Context specific validity of a match, e.g. whether nested effects
	/// produce types their parent parameters accept.
	fn test_match(&self, tree: &MatchTree, node: NodeId) -> bool;

	/// Turn an effect match and its already evaluated arguments into a value.
	fn evaluate_effect(
		&mut self,
		tree: &MatchTree,
		node: NodeId,
		args: Vec<String>,
	) -> SnipResult<String>;

	/// Hand an evaluated match to the environment. This is the one step that
	/// is expected to fail in normal operation.
	fn apply_result(&mut self, result: String, effect: Option<&Effect>) -> SnipResult<()>;

	/// Candidate values for an argument leaf.
	fn argument_completions(&mut self, tree: &MatchTree, node: NodeId) -> Vec<String>;

	/// Classify a single query token, e.g. `expr:int` for `42`.
	fn query_token_interpretation(&self, token: &str) -> String;

	/// Called once before each top level evaluation. State gathered while
	/// evaluating, such as reserved names, is shared by the nested effects of
	/// one walk and must not outlive it.
	fn begin_evaluation(&mut self) {}

	/// Interpret every whitespace separated token of `query`. When a token
	/// repeats, the interpretation of its last occurrence wins.
	fn query_token_interpretations(&self, query: &str) -> HashMap<String, String> {
		let mut interpretations = HashMap::new();

		for token in query.split_whitespace() {
			interpretations.insert(token.to_string(), self.query_token_interpretation(token));
		}

		interpretations
	}

	/// Evaluate `node` and apply the result.
	fn apply_match(&mut self, tree: &MatchTree, node: NodeId) -> SnipResult<()> {
		let result = self.evaluate_match_node(tree, node, false)?;
		let effect = tree.effect_node(node).map(|effect_node| Rc::clone(effect_node.effect()));
		self.apply_result(result, effect.as_deref())
	}

	/// Evaluate a match tree bottom up, after one call to
	/// [`begin_evaluation`](Self::begin_evaluation).
	///
	/// Effect matches evaluate their children in parameter order and pass the
	/// values to [`evaluate_effect`](Self::evaluate_effect). Argument leaves
	/// evaluate to their parameter's fixed value when it has one, otherwise
	/// to their text. In overview mode a leaf without a fixed value renders
	/// as a `$` placeholder followed by its text, so incomplete matches can
	/// still be shown as a readable template.
	fn evaluate_match_node(
		&mut self,
		tree: &MatchTree,
		node: NodeId,
		overview: bool,
	) -> SnipResult<String> {
		self.begin_evaluation();
		evaluate_subtree(self, tree, node, overview)
	}
}

fn evaluate_subtree<M: MatchEnvironment + ?Sized>(
	env: &mut M,
	tree: &MatchTree,
	node: NodeId,
	overview: bool,
) -> SnipResult<String> {
	match tree[node].kind() {
		MatchNodeKind::Effect(effect_node) => {
			let mut args = Vec::with_capacity(effect_node.num_children());
			for child in effect_node.children() {
				args.push(evaluate_subtree(env, tree, *child, overview)?);
			}

			env.evaluate_effect(tree, node, args)
		}
		MatchNodeKind::Argument(argument_node) => {
			if let Some(value) = argument_node.parameter().and_then(|param| param.fixed_value()) {
				return Ok(value.to_string());
			}

			let argument = argument_node.argument().unwrap_or_default();
			if overview {
				Ok(format!("{PLACEHOLDER_PREFIX}{argument}"))
			} else {
				Ok(argument.to_string())
			}
		}
	}
}

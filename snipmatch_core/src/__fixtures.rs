use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use super::*;

pub fn effect_with_code(id: &str, code: &str) -> Rc<Effect> {
	Rc::new(Effect::new(id).with_code(code))
}

/// `${coll}.add(${elem})` over a typed collection and an untyped element.
pub fn list_add_effect() -> Rc<Effect> {
	Rc::new(
		Effect::new("list-add")
			.with_pattern("add $elem to $coll")
			.with_parameter(EffectParameter::new("coll", "expr", "java.util.List"))
			.with_parameter(EffectParameter::new("elem", "expr", ""))
			.with_types("stmt", "")
			.with_code("${coll}.add(${elem})"),
	)
}

pub fn three_parameter_effect() -> Rc<Effect> {
	Rc::new(
		Effect::new("triple")
			.with_parameter(EffectParameter::new("a", "expr", ""))
			.with_parameter(EffectParameter::new("b", "expr", ""))
			.with_parameter(EffectParameter::new("c", "expr", ""))
			.with_code("${a} ${b} ${c}"),
	)
}

/// An expression effect producing a value of `minor_type`.
pub fn expression_effect(id: &str, minor_type: &str) -> Rc<Effect> {
	Rc::new(
		Effect::new(id)
			.with_types("expr", minor_type)
			.with_code(format!("{id}()")),
	)
}

/// A tree holding one effect match with argument leaves bound to `args`.
pub fn bound_tree(effect: &Rc<Effect>, args: &[Option<&str>]) -> (MatchTree, NodeId) {
	let mut tree = MatchTree::new();
	let children = effect
		.parameters()
		.iter()
		.zip(args)
		.map(|(param, arg)| tree.add_argument(Some(param.clone()), arg.map(ToString::to_string)))
		.collect();
	let root = tree
		.add_effect(Rc::clone(effect), "pattern", children)
		.expect("fixture children match the parameters");

	(tree, root)
}

/// A [`SnippetEvaluator`] with canned formula values that records what it
/// sees.
#[derive(Debug, Default)]
pub struct StubEvaluator {
	pub values: HashMap<String, String>,
	pub lookups: Vec<(String, Option<String>)>,
	pub applied: Vec<(String, Option<String>)>,
	pub resets: usize,
	pub evaluations: usize,
	pub fail_apply: bool,
	pub interpretations: Cell<usize>,
}

impl StubEvaluator {
	pub fn with_value(mut self, name: &str, value: &str) -> Self {
		self.values.insert(name.to_string(), value.to_string());
		self
	}
}

impl SnippetEvaluator for StubEvaluator {
	fn name(&self) -> &str {
		"stub"
	}

	fn reset(&mut self) {
		self.resets += 1;
	}

	fn begin_evaluation(&mut self) {
		self.evaluations += 1;
	}

	fn test_match(&self, _tree: &MatchTree, _node: NodeId) -> bool {
		true
	}

	fn apply_result(&mut self, result: String, effect: Option<&Effect>) -> SnipResult<()> {
		if self.fail_apply {
			return Err(SnipError::ApplyFailed {
				reason: "stub rejected the change".to_string(),
			});
		}

		self.applied.push((result, effect.map(|effect| effect.id().to_string())));
		Ok(())
	}

	fn argument_completions(&mut self, _tree: &MatchTree, _node: NodeId) -> Vec<String> {
		vec![String::new()]
	}

	/// Each call yields a fresh interpretation so repeated tokens are
	/// distinguishable.
	fn query_token_interpretation(&self, _token: &str) -> String {
		let call = self.interpretations.get() + 1;
		self.interpretations.set(call);
		format!("call{call}")
	}

	fn evaluate_formula_snippet_node(
		&mut self,
		node: &FormulaSnippetNode,
		variables: &Variables,
		_tree: &MatchTree,
		_effect_node: NodeId,
	) -> SnipResult<String> {
		let bound = variables.value(node.name()).map(ToString::to_string);
		self.lookups.push((node.name().to_string(), bound.clone()));

		Ok(bound
			.or_else(|| self.values.get(node.name()).cloned())
			.unwrap_or_default())
	}
}

pub fn stub_environment() -> SnippetMatchEnvironment<StubEvaluator> {
	SnippetMatchEnvironment::new(StubEvaluator::default())
}

/// A document with a few declared variables of assorted types.
pub fn java_document() -> DocumentEnvironment {
	DocumentEnvironment::new("class A {\n\tvoid run() {\n\t\t\n\t}\n}")
		.with_selection(26..26)
		.with_variable("names", "java.util.List<String>")
		.with_variable("name", "String")
		.with_variable("nameCount", "int")
		.with_variable("values", "double[]")
		.with_variable("i", "int")
}

pub fn document_environment() -> SnippetMatchEnvironment<DocumentEnvironment> {
	SnippetMatchEnvironment::new(java_document())
}

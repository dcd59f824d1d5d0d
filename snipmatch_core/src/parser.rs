use std::rc::Rc;

use crate::Effect;
use crate::FormulaErrorKind;
use crate::SnipError;
use crate::SnipResult;
use crate::lexer::Segment;
use crate::lexer::scan;

/// One compiled piece of an effect's code.
#[derive(Debug, Clone, PartialEq)]
pub enum SnippetNode {
	Text(TextSnippetNode),
	Formula(FormulaSnippetNode),
}

impl SnippetNode {
	/// The effect this node was parsed from.
	pub fn effect(&self) -> &Rc<Effect> {
		match self {
			Self::Text(node) => node.effect(),
			Self::Formula(node) => node.effect(),
		}
	}
}

/// A literal run of text.
#[derive(Debug, Clone)]
pub struct TextSnippetNode {
	text: String,
	effect: Rc<Effect>,
}

impl TextSnippetNode {
	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn effect(&self) -> &Rc<Effect> {
		&self.effect
	}
}

impl PartialEq for TextSnippetNode {
	fn eq(&self, other: &Self) -> bool {
		self.text == other.text && Rc::ptr_eq(&self.effect, &other.effect)
	}
}

/// A `${...}` formula invocation.
///
/// `${name}`, `${name(a,b)}`, `${var:name}` and `${var:name(a,b)}` are all
/// formulas. Arguments are the raw comma separated substrings between the
/// parentheses.
#[derive(Debug, Clone)]
pub struct FormulaSnippetNode {
	name: String,
	arguments: Vec<String>,
	new_variable: Option<String>,
	effect: Rc<Effect>,
}

impl FormulaSnippetNode {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn arguments(&self) -> &[String] {
		&self.arguments
	}

	pub fn argument(&self, index: usize) -> Option<&str> {
		self.arguments.get(index).map(String::as_str)
	}

	pub fn num_arguments(&self) -> usize {
		self.arguments.len()
	}

	/// The variable that captures this formula's value for later formulas.
	pub fn new_variable(&self) -> Option<&str> {
		self.new_variable.as_deref()
	}

	pub fn effect(&self) -> &Rc<Effect> {
		&self.effect
	}
}

impl PartialEq for FormulaSnippetNode {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name
			&& self.arguments == other.arguments
			&& self.new_variable == other.new_variable
			&& Rc::ptr_eq(&self.effect, &other.effect)
	}
}

/// Compile an effect's code into an ordered list of text and formula nodes.
///
/// Any malformed formula aborts the whole parse; no partial node list is
/// returned.
///
/// ```rust
/// use std::rc::Rc;
///
/// use snipmatch_core::Effect;
/// use snipmatch_core::SnippetNode;
/// use snipmatch_core::parse_snippet_nodes;
///
/// let effect = Rc::new(Effect::new("demo").with_code("x${f(a,b)}y"));
/// let nodes = parse_snippet_nodes(&effect)?;
///
/// assert_eq!(nodes.len(), 3);
/// let SnippetNode::Formula(formula) = &nodes[1] else {
/// 	panic!("expected a formula");
/// };
/// assert_eq!(formula.name(), "f");
/// assert_eq!(formula.arguments(), ["a", "b"]);
/// # Ok::<(), snipmatch_core::SnipError>(())
/// ```
pub fn parse_snippet_nodes(effect: &Rc<Effect>) -> SnipResult<Vec<SnippetNode>> {
	scan(effect.code())
		.into_iter()
		.map(|segment| {
			match segment {
				Segment::Text(text) => {
					Ok(SnippetNode::Text(TextSnippetNode {
						text,
						effect: Rc::clone(effect),
					}))
				}
				Segment::Formula { body, offset } => {
					parse_formula(&body, effect).map(SnippetNode::Formula).map_err(|reason| {
						SnipError::InvalidFormula {
							effect: effect.id().to_string(),
							formula: body,
							offset,
							reason,
						}
					})
				}
			}
		})
		.collect()
}

/// Parse one formula body: `[newVar ':'] name ['(' args ')']`.
fn parse_formula(body: &str, effect: &Rc<Effect>) -> Result<FormulaSnippetNode, FormulaErrorKind> {
	let body = body.trim();
	if body.is_empty() {
		return Err(FormulaErrorKind::Empty);
	}

	let head_end = body.find('(').unwrap_or(body.len());
	let (new_variable, rest) = match body[..head_end].find(':') {
		Some(colon) => {
			let variable = body[..colon].trim();
			if !is_identifier(variable) {
				return Err(FormulaErrorKind::InvalidVariableName);
			}
			(Some(variable.to_string()), &body[colon + 1..])
		}
		None => (None, body),
	};

	let (name, arguments) = match rest.split_once('(') {
		Some((name, tail)) => {
			let Some(inner) = tail.trim_end().strip_suffix(')') else {
				return Err(if tail.contains(')') {
					FormulaErrorKind::TrailingText
				} else {
					FormulaErrorKind::UnclosedArguments
				});
			};

			if inner.contains('(') {
				return Err(FormulaErrorKind::NestedParentheses);
			}

			if inner.contains(')') {
				return Err(FormulaErrorKind::TrailingText);
			}

			let arguments = if inner.is_empty() {
				vec![]
			} else {
				inner.split(',').map(str::to_string).collect()
			};

			(name.trim(), arguments)
		}
		None => (rest.trim(), vec![]),
	};

	if !is_identifier(name) {
		return Err(FormulaErrorKind::InvalidName);
	}

	Ok(FormulaSnippetNode {
		name: name.to_string(),
		arguments,
		new_variable,
		effect: Rc::clone(effect),
	})
}

fn is_identifier(text: &str) -> bool {
	let mut chars = text.chars();
	let Some(first) = chars.next() else {
		return false;
	};

	(first.is_alphabetic() || first == '_') && chars.all(|ch| ch.is_alphanumeric() || ch == '_')
}

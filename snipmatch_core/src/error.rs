use miette::Diagnostic;
use thiserror::Error;

use crate::NodeId;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SnipError {
	#[error(transparent)]
	#[diagnostic(code(snipmatch::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid formula `{formula}` in effect `{effect}` at offset {offset}: {reason}")]
	#[diagnostic(
		code(snipmatch::invalid_formula),
		help("formulas take the form `${{name}}`, `${{name(a,b)}}` or `${{var:name(a,b)}}`; use `$$` for a literal `$`")
	)]
	InvalidFormula {
		effect: String,
		formula: String,
		offset: usize,
		reason: FormulaErrorKind,
	},

	#[error("effect `{effect}` expects {expected} child match(es), got {got}")]
	#[diagnostic(
		code(snipmatch::child_count_mismatch),
		help("an effect match needs exactly one child per effect parameter")
	)]
	ChildCountMismatch {
		effect: String,
		expected: usize,
		got: usize,
	},

	#[error("match node {0} already has a parent")]
	#[diagnostic(
		code(snipmatch::node_already_attached),
		help("clone the node with `MatchTree::clone_node` to reuse it under another effect")
	)]
	NodeAlreadyAttached(NodeId),

	#[error("match node {0} is not an effect match")]
	#[diagnostic(code(snipmatch::not_an_effect_node))]
	NotAnEffectNode(NodeId),

	#[error("failed to apply result: {reason}")]
	#[diagnostic(code(snipmatch::apply_failed))]
	ApplyFailed { reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(snipmatch::config_parse),
		help("check that snipmatch.toml is valid TOML")
	)]
	ConfigParse(String),
}

/// The reason a `${...}` formula could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FormulaErrorKind {
	#[error("the formula is empty")]
	Empty,
	#[error("the formula name is not a valid identifier")]
	InvalidName,
	#[error("the captured variable name is not a valid identifier")]
	InvalidVariableName,
	#[error("the argument list is missing a closing `)`")]
	UnclosedArguments,
	#[error("nested parentheses are not supported in argument lists")]
	NestedParentheses,
	#[error("unexpected text after the argument list")]
	TrailingText,
}

pub type SnipResult<T> = Result<T, SnipError>;

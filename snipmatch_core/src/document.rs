use std::ops::Range;

use indexmap::IndexMap;

use crate::Effect;
use crate::FormulaSnippetNode;
use crate::IDENT_TYPE;
use crate::MatchEnvironment;
use crate::MatchNodeKind;
use crate::MatchTree;
use crate::NUMBER_TYPE;
use crate::NodeId;
use crate::SnipError;
use crate::SnipResult;
use crate::SnipmatchConfig;
use crate::SnippetEvaluator;
use crate::SnippetMatchEnvironment;
use crate::TextSnippetNode;
use crate::TypeCompatibility;
use crate::Variables;
use crate::element_type;
use crate::is_numeric_type;

/// Name of the [`DocumentEnvironment`].
pub const DOCUMENT_ENVIRONMENT_NAME: &str = "document";

const MAJOR_TYPES: &[&str] = &["expr", "stmt", "ident"];
const ITERATOR_NAMES: &[&str] = &["i", "j", "k", "l", "m", "n"];
const HELPER_START: &str = "${helper}";
const HELPER_END: &str = "${endHelper}";
const SNIPPET_ID_TAG: &str = "// Snippet ID: ";

/// Helper class code captured between `${helper}` and `${endHelper}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCode {
	effect_id: String,
	code: String,
}

impl HelperCode {
	/// Id of the effect whose code declared the helper.
	pub fn effect_id(&self) -> &str {
		&self.effect_id
	}

	pub fn code(&self) -> &str {
		&self.code
	}
}

/// A plain in-memory text document with a selection.
///
/// Stands in for a live editor: the document knows a table of declared
/// variables (name to type) that it uses to validate matches, complete
/// arguments and interpret query tokens. Applying a result replaces the
/// selection of the original text, adds missing imports and appends helper
/// classes; [`reset`](SnippetEvaluator::reset) restores it.
#[derive(Debug, Clone)]
pub struct DocumentEnvironment {
	original: String,
	text: String,
	selection: Range<usize>,
	declared: IndexMap<String, String>,
	config: SnipmatchConfig,
	compatibility: TypeCompatibility,
	new_imports: Vec<String>,
	new_helpers: Vec<HelperCode>,
	reading_helper: bool,
	reserved_names: Vec<String>,
	cursor: Option<usize>,
	clean: bool,
}

impl DocumentEnvironment {
	/// A document with an empty selection at its end.
	pub fn new(text: impl Into<String>) -> Self {
		Self::with_config(text, SnipmatchConfig::default())
	}

	pub fn with_config(text: impl Into<String>, config: SnipmatchConfig) -> Self {
		let original = text.into();
		let end = original.len();

		Self {
			text: original.clone(),
			original,
			selection: end..end,
			declared: IndexMap::new(),
			compatibility: config.type_compatibility(),
			config,
			new_imports: vec![],
			new_helpers: vec![],
			reading_helper: false,
			reserved_names: vec![],
			cursor: None,
			clean: true,
		}
	}

	#[must_use]
	pub fn with_selection(mut self, selection: Range<usize>) -> Self {
		self.selection = selection;
		self
	}

	#[must_use]
	pub fn with_variable(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
		self.declare_variable(name, ty);
		self
	}

	/// Make a variable visible at the selection. Redeclaring replaces the
	/// type.
	pub fn declare_variable(&mut self, name: impl Into<String>, ty: impl Into<String>) {
		self.declared.insert(name.into(), ty.into());
	}

	pub fn declared_type(&self, name: &str) -> Option<&str> {
		self.declared.get(name).map(String::as_str)
	}

	pub fn set_selection(&mut self, selection: Range<usize>) {
		self.selection = selection;
	}

	pub fn selection(&self) -> Range<usize> {
		self.selection.clone()
	}

	/// The current text, including any applied result.
	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn original_text(&self) -> &str {
		&self.original
	}

	/// Byte offset of the cursor after the last applied result.
	pub fn cursor(&self) -> Option<usize> {
		self.cursor
	}

	/// Imports requested by `${import(...)}` formulas, each recorded once.
	pub fn new_imports(&self) -> &[String] {
		&self.new_imports
	}

	/// Helpers captured by the last evaluation.
	pub fn new_helpers(&self) -> &[HelperCode] {
		&self.new_helpers
	}

	/// False once a result has been applied and not yet reset.
	pub fn is_clean(&self) -> bool {
		self.clean
	}

	pub fn config(&self) -> &SnipmatchConfig {
		&self.config
	}

	pub fn compatibility(&self) -> &TypeCompatibility {
		&self.compatibility
	}

	fn clear_evaluation_state(&mut self) {
		self.new_imports.clear();
		self.new_helpers.clear();
		self.reserved_names.clear();
		self.reading_helper = false;
	}

	fn is_taken(&self, name: &str, variables: &Variables) -> bool {
		self.declared.contains_key(name)
			|| variables.values().any(|value| value == name)
			|| self.reserved_names.iter().any(|reserved| reserved == name)
	}

	/// First of `desired`, `desired2`, `desired3`, ... that is free. The
	/// name is reserved for the rest of the evaluation.
	fn free_name(&mut self, desired: &str, variables: &Variables) -> String {
		let mut name = desired.to_string();
		let mut suffix = 2;

		while self.is_taken(&name, variables) {
			name = format!("{desired}{suffix}");
			suffix += 1;
		}

		self.reserved_names.push(name.clone());
		name
	}

	/// The `import` lines for every requested import the document lacks,
	/// laid out to be inserted at `import_at`.
	fn import_block(&self, import_at: usize) -> String {
		let missing: Vec<&str> = self
			.new_imports
			.iter()
			.map(String::as_str)
			.filter(|import| !has_import(&self.original, import))
			.collect();
		if missing.is_empty() {
			return String::new();
		}

		let before = &self.original[..import_at];
		let after = &self.original[import_at..];
		let first_imports = !self.original.lines().any(is_import_line);
		let mut block = String::new();

		if !before.is_empty() && !before.ends_with('\n') {
			block.push('\n');
		}
		if first_imports && !before.is_empty() && !before.ends_with("\n\n") {
			block.push('\n');
		}
		for import in missing {
			block.push_str("import ");
			block.push_str(import);
			block.push_str(";\n");
		}
		if first_imports && !after.starts_with('\n') {
			block.push('\n');
		}

		block
	}

	/// Tag each captured helper with its effect id and give its class a name
	/// no other class in the document uses, renaming it in `snippet` too.
	/// Helpers the document already holds under the same tag are skipped.
	fn prepare_helpers(&self, snippet: &mut String) -> Vec<String> {
		let existing = class_names(&self.original);
		let mut taken: Vec<String> = vec![];
		let mut sources = vec![];

		for helper in &self.new_helpers {
			let mut code = helper
				.code
				.trim()
				.replace("public class", "class")
				.replace("private class", "class");
			if code.is_empty() {
				continue;
			}

			if let Some(name) = class_names(&code).first().map(ToString::to_string) {
				let free = self.free_helper_name(&name, &helper.effect_id, &existing, &taken);
				let Some(free) = free else {
					tracing::trace!(
						effect = helper.effect_id.as_str(),
						class = name.as_str(),
						"helper already present"
					);
					continue;
				};

				if free != name {
					code = rename_identifier(&code, &name, &free);
					*snippet = rename_identifier(snippet, &name, &free);
				}
				taken.push(free);
			}

			sources.push(format!("{SNIPPET_ID_TAG}{}\n{code}", helper.effect_id));
		}

		sources
	}

	/// First of `desired`, `desired2`, ... that names no class yet. `None`
	/// when a class of that name tagged with `effect_id` is already there.
	fn free_helper_name(
		&self,
		desired: &str,
		effect_id: &str,
		existing: &[&str],
		taken: &[String],
	) -> Option<String> {
		let mut name = desired.to_string();
		let mut suffix = 2;

		loop {
			let in_document = existing.contains(&name.as_str());
			if !in_document && !taken.contains(&name) {
				return Some(name);
			}

			if in_document && is_tagged_class(&self.original, effect_id, &name) {
				return None;
			}

			name = format!("{desired}{suffix}");
			suffix += 1;
		}
	}

	fn iterator_name(&mut self, variables: &Variables) -> String {
		match ITERATOR_NAMES
			.iter()
			.find(|name| !self.is_taken(name, variables))
		{
			Some(name) => (*name).to_string(),
			None => self.free_name(ITERATOR_NAMES[0], variables),
		}
	}

	fn evaluate_nullary(
		&mut self,
		node: &FormulaSnippetNode,
		variables: &Variables,
		tree: &MatchTree,
		effect_node: NodeId,
	) -> String {
		if let Some(value) = variables.value(node.name()) {
			return value.to_string();
		}

		match node.name() {
			"cursor" => self.config.cursor_marker.clone(),
			"dollar" => "$".to_string(),
			"iter" => self.iterator_name(variables),
			"id" => node.effect().id().to_string(),
			"snipType" => snippet_type(tree, effect_node),
			"helper" => {
				self.reading_helper = true;
				self.new_helpers.push(HelperCode {
					effect_id: node.effect().id().to_string(),
					code: String::new(),
				});
				String::new()
			}
			"endHelper" => {
				self.reading_helper = false;
				String::new()
			}
			_ => String::new(),
		}
	}

	fn evaluate_unary(
		&mut self,
		node: &FormulaSnippetNode,
		variables: &Variables,
		tree: &MatchTree,
		effect_node: NodeId,
	) -> String {
		let argument = node.argument(0).unwrap_or_default().trim();

		match node.name() {
			"import" => {
				let recorded = self.new_imports.iter().any(|import| import == argument);
				if !argument.is_empty() && !recorded {
					self.new_imports.push(argument.to_string());
				}
				String::new()
			}
			"elemType" => {
				let value = variables.value(argument).unwrap_or(argument);
				self.declared_type(value)
					.and_then(element_type)
					.unwrap_or_default()
					.to_string()
			}
			"snipType" => snippet_type(tree, effect_node),
			"freeName" => self.free_name(argument, variables),
			_ => String::new(),
		}
	}
}

fn snippet_type(tree: &MatchTree, effect_node: NodeId) -> String {
	tree.effect_node(effect_node)
		.map(|node| node.effect().minor_type().to_string())
		.unwrap_or_default()
}

fn is_digits(text: &str) -> bool {
	text.chars().all(|ch| ch.is_ascii_digit())
}

fn is_identifier_char(ch: char) -> bool {
	ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn is_import_line(line: &str) -> bool {
	line.trim_start().starts_with("import ")
}

fn has_import(text: &str, import: &str) -> bool {
	text.lines().any(|line| {
		line.trim()
			.strip_prefix("import ")
			.and_then(|rest| rest.strip_suffix(';'))
			.is_some_and(|name| name.trim() == import)
	})
}

/// Byte offset just past the last `import` or `package` line, or 0.
fn import_position(text: &str) -> usize {
	let mut position = 0;
	let mut offset = 0;

	for line in text.split_inclusive('\n') {
		let trimmed = line.trim_start();
		if trimmed.starts_with("import ") || trimmed.starts_with("package ") {
			position = offset + line.len();
		}
		offset += line.len();
	}

	position
}

/// Names following each `class` keyword, in order.
fn class_names(code: &str) -> Vec<&str> {
	let mut names = vec![];
	let mut tokens = code.split_whitespace();

	while let Some(token) = tokens.next() {
		if token != "class" {
			continue;
		}

		if let Some(next) = tokens.next() {
			let end = next.find(|ch: char| !is_identifier_char(ch)).unwrap_or(next.len());
			if end > 0 {
				names.push(&next[..end]);
			}
		}
	}

	names
}

/// True when a `// Snippet ID: <effect_id>` line directly precedes the
/// declaration of class `name`.
fn is_tagged_class(text: &str, effect_id: &str, name: &str) -> bool {
	let tag = format!("{SNIPPET_ID_TAG}{effect_id}");
	let mut lines = text.lines().map(str::trim).peekable();

	while let Some(line) = lines.next() {
		if line == tag && lines.peek().is_some_and(|next| class_names(next).contains(&name)) {
			return true;
		}
	}

	false
}

/// Replace whole-identifier occurrences of `from` with `to`.
fn rename_identifier(text: &str, from: &str, to: &str) -> String {
	let mut renamed = String::with_capacity(text.len());
	let mut last = 0;

	for (index, _) in text.match_indices(from) {
		let before = text[..index].chars().next_back();
		let after = text[index + from.len()..].chars().next();
		if before.is_some_and(is_identifier_char) || after.is_some_and(is_identifier_char) {
			continue;
		}

		renamed.push_str(&text[last..index]);
		renamed.push_str(to);
		last = index + from.len();
	}

	renamed.push_str(&text[last..]);
	renamed
}

/// Append each helper after the document body, separated by a blank line.
fn append_helpers(text: &mut String, helpers: &[String]) {
	let trailing_newline = text.ends_with('\n');

	for helper in helpers {
		if !text.is_empty() {
			text.push_str(if trailing_newline { "\n" } else { "\n\n" });
		}
		text.push_str(helper);
		if trailing_newline {
			text.push('\n');
		}
	}
}

/// The raw code between `${helper}` and `${endHelper}`, if both are present
/// in that order.
fn helper_section(code: &str) -> Option<&str> {
	let start = code.find(HELPER_START)? + HELPER_START.len();
	let end = code.find(HELPER_END)?;
	(end > start).then(|| &code[start..end])
}

impl SnippetEvaluator for DocumentEnvironment {
	fn name(&self) -> &str {
		DOCUMENT_ENVIRONMENT_NAME
	}

	fn friendly_name(&self) -> &str {
		"Plain Document"
	}

	fn major_types(&self) -> &[&str] {
		MAJOR_TYPES
	}

	fn reset(&mut self) {
		self.text.clone_from(&self.original);
		self.cursor = None;
		self.clear_evaluation_state();
		self.clean = true;
	}

	fn begin_evaluation(&mut self) {
		self.clear_evaluation_state();
	}

	/// Nested effect matches bound to typed `expr` parameters must produce a
	/// compatible minor type. Every child is checked, recursively.
	fn test_match(&self, tree: &MatchTree, node: NodeId) -> bool {
		let Some(effect_node) = tree.effect_node(node) else {
			return true;
		};
		let effect = effect_node.effect();

		for (index, child) in effect_node.children().iter().enumerate() {
			if !self.test_match(tree, *child) {
				return false;
			}

			let (Some(param), Some(child_node)) =
				(effect.parameter(index), tree.effect_node(*child))
			else {
				continue;
			};

			if param.major_type() != "expr" || param.minor_type().is_empty() {
				continue;
			}

			let child_type = child_node.effect().minor_type();
			if child_type.is_empty()
				|| !self.compatibility.is_compatible(param.minor_type(), child_type)
			{
				tracing::trace!(
					effect = effect.id(),
					parameter = param.name(),
					child_type,
					"nested match has an incompatible type"
				);
				return false;
			}
		}

		true
	}

	fn apply_result(&mut self, result: String, effect: Option<&Effect>) -> SnipResult<()> {
		if let Some(effect) = effect {
			let target = effect.environment_name();
			if !target.is_empty() && target != DOCUMENT_ENVIRONMENT_NAME {
				tracing::debug!(
					effect = effect.id(),
					target,
					"rejected result for another environment"
				);
				return Err(SnipError::ApplyFailed {
					reason: format!("effect `{}` targets the `{target}` environment", effect.id()),
				});
			}
		}

		let Range { start, end } = self.selection.clone();
		let valid = start <= end
			&& end <= self.original.len()
			&& self.original.is_char_boundary(start)
			&& self.original.is_char_boundary(end);
		if !valid {
			tracing::debug!(start, end, "rejected result for an invalid selection");
			return Err(SnipError::ApplyFailed {
				reason: format!(
					"selection {start}..{end} is outside the document of {} bytes",
					self.original.len()
				),
			});
		}

		let mut snippet = result.trim().to_string();
		let helpers = self.prepare_helpers(&mut snippet);
		let marker = self.config.cursor_marker.as_str();
		let (cursor, inserted) = if marker.is_empty() {
			(None, snippet)
		} else {
			(snippet.find(marker), snippet.replace(marker, ""))
		};

		let import_at = import_position(&self.original).min(start);
		let imports = self.import_block(import_at);
		let mut text = String::with_capacity(self.original.len() + imports.len() + inserted.len());
		text.push_str(&self.original[..import_at]);
		text.push_str(&imports);
		text.push_str(&self.original[import_at..start]);
		text.push_str(&inserted);
		text.push_str(&self.original[end..]);
		append_helpers(&mut text, &helpers);

		self.cursor = Some(imports.len() + start + cursor.unwrap_or(inserted.len()));
		self.text = text;
		self.clean = false;
		tracing::debug!(
			start,
			end,
			inserted = inserted.len(),
			imports = imports.len(),
			helpers = helpers.len(),
			"applied result"
		);

		Ok(())
	}

	fn argument_completions(&mut self, tree: &MatchTree, node: NodeId) -> Vec<String> {
		let Some(argument_node) = tree.argument_node(node) else {
			return vec![String::new()];
		};
		let argument = argument_node.argument().unwrap_or_default();
		if argument.is_empty() {
			return vec![String::new()];
		}

		let (major_type, minor_type) = argument_node
			.parameter()
			.map_or(("", ""), |param| (param.major_type(), param.minor_type()));
		let exact_match = self.declared.contains_key(argument);
		let mut completions: Vec<String> = vec![];

		if major_type == "expr" {
			completions.extend(
				self.declared
					.iter()
					.filter(|(name, ty)| {
						name.starts_with(argument)
							&& self.compatibility.is_compatible(minor_type, ty)
					})
					.map(|(name, _)| name.clone())
					.take(self.config.max_argument_completions),
			);

			if !exact_match && !argument.ends_with('.') {
				let literal = if is_numeric_type(minor_type) || minor_type == NUMBER_TYPE {
					is_digits(argument)
				} else if minor_type == "String" {
					argument.starts_with('"')
				} else if minor_type.is_empty() {
					is_digits(argument) || argument.starts_with('"')
				} else if minor_type == IDENT_TYPE {
					!is_digits(argument)
				} else {
					false
				};

				if literal {
					completions.push(argument.to_string());
				}
			}
		}

		completions.sort_by_key(String::len);
		completions.retain(|completion| !completion.is_empty());
		completions.push(String::new());
		completions
	}

	fn query_token_interpretation(&self, token: &str) -> String {
		if token.starts_with('"') {
			return "expr:String".to_string();
		}

		if !token.is_empty() && is_digits(token) {
			return "expr:int".to_string();
		}

		format!("expr:{}", self.declared_type(token).unwrap_or_default())
	}

	fn evaluate_formula_snippet_node(
		&mut self,
		node: &FormulaSnippetNode,
		variables: &Variables,
		tree: &MatchTree,
		effect_node: NodeId,
	) -> SnipResult<String> {
		let result = if node.num_arguments() == 0 {
			self.evaluate_nullary(node, variables, tree, effect_node)
		} else {
			self.evaluate_unary(node, variables, tree, effect_node)
		};

		if self.reading_helper {
			if let Some(helper) = self.new_helpers.last_mut() {
				helper.code.push_str(&result);
			}
			return Ok(String::new());
		}

		Ok(result)
	}

	fn evaluate_text_snippet_node(
		&mut self,
		node: &TextSnippetNode,
		_variables: &Variables,
		_tree: &MatchTree,
		_effect_node: NodeId,
	) -> SnipResult<String> {
		if self.reading_helper {
			if let Some(helper) = self.new_helpers.last_mut() {
				helper.code.push_str(node.text());
			}
			return Ok(String::new());
		}

		Ok(node.text().to_string())
	}
}

impl SnippetMatchEnvironment<DocumentEnvironment> {
	/// Render a match as a readable template for result lists.
	///
	/// Unbound arguments show as `$` placeholders, the cursor marker is
	/// removed and the effect's raw helper code is appended under a
	/// `Helper Classes:` heading. Imports, helpers and reserved names
	/// gathered while rendering are discarded.
	pub fn overview(&mut self, tree: &MatchTree, node: NodeId) -> SnipResult<String> {
		let rendered = self.evaluate_match_node(tree, node, true);
		let evaluator = self.evaluator_mut();
		evaluator.clear_evaluation_state();

		let mut overview = rendered?.replace(evaluator.config.cursor_marker.as_str(), "");

		if let MatchNodeKind::Effect(effect_node) = tree[node].kind() {
			let helper = helper_section(effect_node.effect().code()).filter(|h| !h.is_empty());
			if let Some(helper) = helper {
				overview.push_str("\r\n Helper Classes:\r\n");
				overview.push_str(helper);
			}
		}

		Ok(overview)
	}
}

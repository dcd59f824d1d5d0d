use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;

/// A typed parameter of an [`Effect`].
///
/// Parameters compare equal when their name, major type and minor type match.
/// The optional fixed value does not take part in equality or hashing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectParameter {
	name: String,
	#[serde(default)]
	major_type: String,
	#[serde(default)]
	minor_type: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	fixed_value: Option<String>,
}

impl EffectParameter {
	pub fn new(
		name: impl Into<String>,
		major_type: impl Into<String>,
		minor_type: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			major_type: major_type.into(),
			minor_type: minor_type.into(),
			fixed_value: None,
		}
	}

	/// Attach a constant value. Argument matches bound to this parameter
	/// always evaluate to it, whatever text the user typed.
	#[must_use]
	pub fn with_fixed_value(mut self, value: impl Into<String>) -> Self {
		self.fixed_value = Some(value.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// The broad category, e.g. `expr`, `stmt` or `ident`.
	pub fn major_type(&self) -> &str {
		&self.major_type
	}

	/// The fine-grained type, e.g. `int` or `java.util.List`.
	pub fn minor_type(&self) -> &str {
		&self.minor_type
	}

	pub fn fixed_value(&self) -> Option<&str> {
		self.fixed_value.as_deref()
	}

	pub fn set_name(&mut self, name: impl Into<String>) {
		self.name = name.into();
	}

	pub fn set_major_type(&mut self, major_type: impl Into<String>) {
		self.major_type = major_type.into();
	}

	pub fn set_minor_type(&mut self, minor_type: impl Into<String>) {
		self.minor_type = minor_type.into();
	}
}

impl PartialEq for EffectParameter {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name
			&& self.major_type == other.major_type
			&& self.minor_type == other.minor_type
	}
}

impl Eq for EffectParameter {}

impl Hash for EffectParameter {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.name.hash(state);
		self.major_type.hash(state);
		self.minor_type.hash(state);
	}
}

/// A reusable, parameterized code template.
///
/// An effect carries the search patterns a matcher uses to find it, the
/// ordered parameters that positional match children bind to, and the
/// templated code body. The body may contain `${...}` formulas, see
/// [`parse_snippet_nodes`](crate::parse_snippet_nodes).
///
/// Effects are assembled with the builder and mutator methods while a catalog
/// is being authored. Once wrapped in an `Rc` and handed to a
/// [`MatchTree`](crate::MatchTree) they are treated as immutable; the
/// snippet cache relies on this and on [`Effect::id`] being unique.
///
/// ```rust
/// use snipmatch_core::Effect;
/// use snipmatch_core::EffectParameter;
///
/// let effect = Effect::new("list-add")
/// 	.with_pattern("add $elem to $coll")
/// 	.with_parameter(EffectParameter::new("coll", "expr", "java.util.List"))
/// 	.with_parameter(EffectParameter::new("elem", "expr", ""))
/// 	.with_code("${coll}.add(${elem});");
///
/// assert_eq!(effect.num_parameters(), 2);
/// assert_eq!(effect.parameter_index("elem"), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
	id: String,
	#[serde(default)]
	patterns: Vec<String>,
	#[serde(default)]
	parameters: Vec<EffectParameter>,
	#[serde(default)]
	major_type: String,
	#[serde(default)]
	minor_type: String,
	#[serde(default)]
	code: String,
	#[serde(default)]
	summary: String,
	#[serde(default)]
	environment_name: String,
}

impl Effect {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
		self.patterns.push(pattern.into());
		self
	}

	#[must_use]
	pub fn with_parameter(mut self, parameter: EffectParameter) -> Self {
		self.parameters.push(parameter);
		self
	}

	#[must_use]
	pub fn with_types(
		mut self,
		major_type: impl Into<String>,
		minor_type: impl Into<String>,
	) -> Self {
		self.major_type = major_type.into();
		self.minor_type = minor_type.into();
		self
	}

	#[must_use]
	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = code.into();
		self
	}

	#[must_use]
	pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
		self.summary = summary.into();
		self
	}

	#[must_use]
	pub fn with_environment_name(mut self, environment_name: impl Into<String>) -> Self {
		self.environment_name = environment_name.into();
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn code(&self) -> &str {
		&self.code
	}

	pub fn summary(&self) -> &str {
		&self.summary
	}

	pub fn major_type(&self) -> &str {
		&self.major_type
	}

	pub fn minor_type(&self) -> &str {
		&self.minor_type
	}

	/// `major:minor`, or only the major type when the minor type is empty.
	pub fn full_type(&self) -> String {
		if self.minor_type.is_empty() {
			self.major_type.clone()
		} else {
			format!("{}:{}", self.major_type, self.minor_type)
		}
	}

	/// Name of the [`MatchEnvironment`](crate::MatchEnvironment) this effect
	/// was written for. Empty means any environment.
	pub fn environment_name(&self) -> &str {
		&self.environment_name
	}

	pub fn patterns(&self) -> &[String] {
		&self.patterns
	}

	pub fn pattern(&self, index: usize) -> Option<&str> {
		self.patterns.get(index).map(String::as_str)
	}

	pub fn num_patterns(&self) -> usize {
		self.patterns.len()
	}

	pub fn add_pattern(&mut self, pattern: impl Into<String>) {
		self.patterns.push(pattern.into());
	}

	pub fn remove_pattern(&mut self, index: usize) -> Option<String> {
		(index < self.patterns.len()).then(|| self.patterns.remove(index))
	}

	pub fn parameters(&self) -> &[EffectParameter] {
		&self.parameters
	}

	pub fn parameter(&self, index: usize) -> Option<&EffectParameter> {
		self.parameters.get(index)
	}

	/// Find a parameter by name, scanning left to right.
	pub fn parameter_by_name(&self, name: &str) -> Option<&EffectParameter> {
		self.parameters.iter().find(|param| param.name() == name)
	}

	pub fn parameter_index(&self, name: &str) -> Option<usize> {
		self.parameters.iter().position(|param| param.name() == name)
	}

	pub fn num_parameters(&self) -> usize {
		self.parameters.len()
	}

	pub fn add_parameter(&mut self, parameter: EffectParameter) {
		self.parameters.push(parameter);
	}

	pub fn remove_parameter(&mut self, index: usize) -> Option<EffectParameter> {
		(index < self.parameters.len()).then(|| self.parameters.remove(index))
	}

	pub fn remove_parameter_by_name(&mut self, name: &str) -> Option<EffectParameter> {
		let index = self.parameter_index(name)?;
		self.remove_parameter(index)
	}

	pub fn clear_parameters(&mut self) {
		self.parameters.clear();
	}

	pub fn set_code(&mut self, code: impl Into<String>) {
		self.code = code.into();
	}

	pub fn set_summary(&mut self, summary: impl Into<String>) {
		self.summary = summary.into();
	}
}

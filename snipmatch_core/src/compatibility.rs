use std::collections::BTreeMap;

/// Pseudo type accepted by parameters that want any array.
pub const ARRAY_TYPE: &str = "$array";
/// Pseudo type accepted by parameters that want anything a loop can iterate.
pub const LOOPABLE_TYPE: &str = "$loopable";
/// Pseudo type accepted by parameters that want any numeric primitive.
pub const NUMBER_TYPE: &str = "$number";
/// Pseudo type for parameters that introduce a new identifier.
pub const IDENT_TYPE: &str = "$ident";

const NUMERIC_TYPES: &[&str] = &["int", "long", "short", "byte", "char", "float", "double"];

const DEFAULT_WIDENING: &[(&str, &[&str])] = &[
	("float", &["int", "long", "short", "byte"]),
	("double", &["int", "long", "short", "byte", "float"]),
	("long", &["int", "short", "byte"]),
	("int", &["char", "short", "byte"]),
	("short", &["byte", "char"]),
	("byte", &["char"]),
	("char", &["int", "short", "byte"]),
	(NUMBER_TYPE, NUMERIC_TYPES),
];

const LOOPABLE_CONTAINERS: &[&str] = &[
	"Iterable",
	"Collection",
	"List",
	"Set",
	"SortedSet",
	"Queue",
	"Deque",
	"ArrayList",
	"LinkedList",
	"Vector",
	"Stack",
	"HashSet",
	"LinkedHashSet",
	"TreeSet",
	"ArrayDeque",
	"PriorityQueue",
];

const ANY_TYPES: &[&str] = &["Object", "java.lang.Object"];

/// Decides whether a value of one minor type may be bound where another is
/// expected.
///
/// Beyond exact matches the table knows the primitive widening rules, the
/// `$array`, `$loopable` and `$number` pseudo types and any extra entries
/// merged in from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCompatibility {
	widening: BTreeMap<String, Vec<String>>,
}

impl Default for TypeCompatibility {
	fn default() -> Self {
		let widening = DEFAULT_WIDENING
			.iter()
			.map(|(expected, accepted)| {
				let accepted = accepted.iter().map(ToString::to_string).collect();
				((*expected).to_string(), accepted)
			})
			.collect();

		Self { widening }
	}
}

impl TypeCompatibility {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add accepted types for `expected` on top of the existing entries.
	pub fn extend(
		&mut self,
		expected: impl Into<String>,
		accepted: impl IntoIterator<Item = String>,
	) {
		let entry = self.widening.entry(expected.into()).or_default();
		for ty in accepted {
			if !entry.contains(&ty) {
				entry.push(ty);
			}
		}
	}

	/// The types `expected` accepts through widening, exact matches aside.
	pub fn accepted(&self, expected: &str) -> &[String] {
		self.widening.get(expected).map(Vec::as_slice).unwrap_or_default()
	}

	/// True when a value typed `actual` fits a slot typed `expected`.
	///
	/// An empty expected type accepts everything. An empty actual type only
	/// fits an empty expected type.
	pub fn is_compatible(&self, expected: &str, actual: &str) -> bool {
		if expected.is_empty() || expected == actual {
			return true;
		}

		if actual.is_empty() {
			return false;
		}

		if ANY_TYPES.contains(&expected) {
			return true;
		}

		if (expected == ARRAY_TYPE || expected == "[]") && is_array_type(actual) {
			return true;
		}

		if expected == LOOPABLE_TYPE && is_loopable_type(actual) {
			return true;
		}

		self.accepted(expected).iter().any(|ty| ty == actual)
	}
}

/// True for the primitive numeric types.
pub fn is_numeric_type(ty: &str) -> bool {
	NUMERIC_TYPES.contains(&ty)
}

pub fn is_array_type(ty: &str) -> bool {
	ty.ends_with("[]")
}

/// Arrays and the common collection types, with or without type arguments
/// and package qualifiers.
pub fn is_loopable_type(ty: &str) -> bool {
	if is_array_type(ty) {
		return true;
	}

	let base = ty.split_once('<').map_or(ty, |(base, _)| base).trim();
	let simple = base.rsplit_once('.').map_or(base, |(_, simple)| simple);
	LOOPABLE_CONTAINERS.contains(&simple)
}

/// The element type of an array or a single-argument generic type:
/// `T[]` gives `T`, `C<T>` gives `T`.
pub fn element_type(ty: &str) -> Option<&str> {
	if let Some(element) = ty.strip_suffix("[]") {
		return Some(element.trim());
	}

	let (_, arguments) = ty.split_once('<')?;
	let element = arguments.strip_suffix('>')?.trim();
	(!element.is_empty()).then_some(element)
}

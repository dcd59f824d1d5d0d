use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::SnipError;
use crate::SnipResult;
use crate::TypeCompatibility;

/// Default cap on identifier completions offered per argument.
pub const DEFAULT_MAX_ARGUMENT_COMPLETIONS: usize = 5;

/// Default text emitted by the `cursor` formula.
pub const DEFAULT_CURSOR_MARKER: &str = "/*${cursor}*/";

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["snipmatch.toml", ".snipmatch.toml", ".config/snipmatch.toml"];

/// Configuration loaded from a `snipmatch.toml` file.
///
/// ```toml
/// max_argument_completions = 8
/// cursor_marker = "/*|*/"
///
/// [compatible]
/// "java.util.Collection" = ["java.util.List", "java.util.Set"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnipmatchConfig {
	/// Maximum number of identifier candidates returned for one argument,
	/// before literal interpretations are added.
	#[serde(default = "default_max_argument_completions")]
	pub max_argument_completions: usize,
	/// Text the `cursor` formula emits. Removed again when a result is
	/// applied, leaving the cursor at its position.
	#[serde(default = "default_cursor_marker")]
	pub cursor_marker: String,
	/// Extra widening rules: each expected type maps to the types it accepts.
	#[serde(default)]
	pub compatible: BTreeMap<String, Vec<String>>,
}

impl Default for SnipmatchConfig {
	fn default() -> Self {
		Self {
			max_argument_completions: DEFAULT_MAX_ARGUMENT_COMPLETIONS,
			cursor_marker: DEFAULT_CURSOR_MARKER.to_string(),
			compatible: BTreeMap::new(),
		}
	}
}

fn default_max_argument_completions() -> usize {
	DEFAULT_MAX_ARGUMENT_COMPLETIONS
}

fn default_cursor_marker() -> String {
	DEFAULT_CURSOR_MARKER.to_string()
}

impl SnipmatchConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> SnipResult<Option<SnipmatchConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: SnipmatchConfig =
			toml::from_str(&content).map_err(|e| SnipError::ConfigParse(e.to_string()))?;
		tracing::debug!(path = %config_path.display(), "loaded snipmatch config");

		Ok(Some(config))
	}

	/// The built-in compatibility table with the `[compatible]` entries
	/// merged in.
	pub fn type_compatibility(&self) -> TypeCompatibility {
		let mut compatibility = TypeCompatibility::default();
		for (expected, accepted) in &self.compatible {
			compatibility.extend(expected.clone(), accepted.iter().cloned());
		}

		compatibility
	}
}

use crate::error::{ReconcileError, Result};
use crate::filter::PickFilter;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Configuration shared by every pipeline stage
///
/// Each stage receives this explicitly; nothing is read from global state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
	/// Regex on directory paths; matching subtrees of the old tree are not walked
	pub walk_exclude: Option<String>,
	/// Keep picks whose source or destination matches
	pub include_pattern: Option<String>,
	/// Drop picks whose source or destination matches
	pub exclude_pattern: Option<String>,
	/// Worker pool size for move detection (`None` = one per CPU)
	pub workers: Option<usize>,
	/// Number of leading bytes the default text classifier inspects
	pub sniff_bytes: usize,
	/// Treat very frequent characters as junk in long sequences
	pub autojunk: bool,
	/// Lowest score the automatic picker accepts (0.0 to 1.0)
	pub auto_accept_threshold: f64,
	/// External visual diff program
	pub diff_tool: Option<String>,
	/// Extra arguments passed before the two paths
	pub diff_tool_args: Vec<String>,
	/// Context lines around each hunk of a rendered diff
	pub context_lines: usize,
}

impl Default for ReconcileConfig {
	fn default() -> Self {
		Self {
			walk_exclude: None,
			include_pattern: None,
			exclude_pattern: None,
			workers: None,
			sniff_bytes: 8192,
			autojunk: true,
			auto_accept_threshold: 0.6,
			diff_tool: None,
			diff_tool_args: Vec::new(),
			context_lines: 3,
		}
	}
}

impl ReconcileConfig {
	/// Load configuration from a TOML file; missing keys keep their defaults
	pub fn from_toml_file(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path)?;
		let config: ReconcileConfig = toml::from_str(&text).map_err(|e| {
			ReconcileError::configuration_error(&path.display().to_string(), &e.to_string())
		})?;
		config.validate()?;
		Ok(config)
	}

	/// Validate the configuration and return errors if invalid
	pub fn validate(&self) -> Result<()> {
		if self.workers == Some(0) {
			return Err(ReconcileError::configuration_error(
				"workers",
				"must be greater than 0",
			));
		}

		if self.sniff_bytes == 0 {
			return Err(ReconcileError::configuration_error(
				"sniff_bytes",
				"must be greater than 0",
			));
		}

		if !(0.0..=1.0).contains(&self.auto_accept_threshold) {
			return Err(ReconcileError::configuration_error(
				"auto_accept_threshold",
				"must be between 0.0 and 1.0",
			));
		}

		if let Some(tool) = &self.diff_tool {
			if tool.trim().is_empty() {
				return Err(ReconcileError::configuration_error("diff_tool", "must not be empty"));
			}
		}

		self.walk_filter()?;
		self.pick_filter()?;
		Ok(())
	}

	/// Compiled `walk_exclude` pattern
	pub fn walk_filter(&self) -> Result<Option<Regex>> {
		self.walk_exclude.as_deref().map(compile_pattern).transpose()
	}

	/// Compiled include/exclude pick filter
	pub fn pick_filter(&self) -> Result<PickFilter> {
		PickFilter::new(self.include_pattern.as_deref(), self.exclude_pattern.as_deref())
	}
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| ReconcileError::InvalidPattern {
		pattern: pattern.to_string(),
		source,
	})
}

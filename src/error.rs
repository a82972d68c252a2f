use std::path::Path;
use thiserror::Error;

/// Error types for the reconciliation pipeline
///
/// Errors fall in two groups. File-scoped errors (`FileUnreadable`) are logged by the
/// stage that hits them and the stage keeps going. Everything else aborts the current
/// stage and is reported to the caller.
#[derive(Error, Debug)]
pub enum ReconcileError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON serialization error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Invalid path: {path}")]
	InvalidPath { path: String },

	#[error("File unreadable: {path} - {cause}")]
	FileUnreadable { path: String, cause: String },

	#[error("Malformed state file {path}: {details}")]
	MalformedState { path: String, details: String },

	#[error("Unsupported state file version in {path}: found {found}, expected {expected}")]
	UnsupportedStateVersion {
		path: String,
		found: u32,
		expected: u32,
	},

	#[error("Cannot aggregate over an empty input: {operation}")]
	EmptyAggregate { operation: String },

	#[error("Invalid pattern '{pattern}': {source}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Configuration error: {parameter} - {reason}")]
	ConfigurationError { parameter: String, reason: String },
}

impl ReconcileError {
	/// File-scoped errors never abort a whole-tree walk
	pub fn is_file_scoped(&self) -> bool {
		matches!(self, ReconcileError::FileUnreadable { .. })
	}

	/// Check if this error is related to configuration issues
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			ReconcileError::ConfigurationError { .. }
				| ReconcileError::InvalidPattern { .. }
				| ReconcileError::InvalidPath { .. }
		)
	}

	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			ReconcileError::Io(_) => "io",
			ReconcileError::Json(_) => "serialization",
			ReconcileError::InvalidPath { .. } => "configuration",
			ReconcileError::FileUnreadable { .. } => "file_unreadable",
			ReconcileError::MalformedState { .. } => "malformed_state",
			ReconcileError::UnsupportedStateVersion { .. } => "malformed_state",
			ReconcileError::EmptyAggregate { .. } => "empty_aggregate",
			ReconcileError::InvalidPattern { .. } => "configuration",
			ReconcileError::ConfigurationError { .. } => "configuration",
		}
	}

	/// Create a file-unreadable error from an I/O failure on `path`
	pub fn file_unreadable(path: &Path, cause: &std::io::Error) -> Self {
		ReconcileError::FileUnreadable {
			path: path.display().to_string(),
			cause: cause.to_string(),
		}
	}

	/// Create a malformed state error
	pub fn malformed_state(path: &Path, details: impl Into<String>) -> Self {
		ReconcileError::MalformedState {
			path: path.display().to_string(),
			details: details.into(),
		}
	}

	/// Create an empty aggregate error
	pub fn empty_aggregate(operation: &str) -> Self {
		ReconcileError::EmptyAggregate { operation: operation.to_string() }
	}

	/// Create a configuration error
	pub fn configuration_error(parameter: &str, reason: &str) -> Self {
		ReconcileError::ConfigurationError {
			parameter: parameter.to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn invalid_path(path: &Path) -> Self {
		ReconcileError::InvalidPath { path: path.display().to_string() }
	}
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

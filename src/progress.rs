use std::path::Path;

/// Trait for reporting progress of long tree walks.
///
/// The binary prints a line per directory; library callers and tests stay silent.
/// All methods have default no-op implementations. `on_file_scored` is called from
/// worker threads.
pub trait ProgressReporter: Send + Sync {
	fn on_walk_start(&self, _root: &Path) {}
	fn on_directory(&self, _dir: &Path) {}
	fn on_file_scored(&self, _done: usize, _total: usize) {}
	fn on_walk_complete(&self, _files: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

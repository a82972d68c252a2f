//! Common test utilities for the reorg-compare library

#![allow(dead_code)]

use reorg_compare::{CandidateMatch, MoveDetector, MoveRecord, ReconcileConfig, SimilarityScore};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn setup_temp_dir() -> TempDir {
	TempDir::new().expect("Failed to create temp directory")
}

/// Create a file with content, creating parent directories as needed
pub fn create_test_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).expect("Failed to create parent directory");
	}
	std::fs::write(&path, content).expect("Failed to write test file");
	path
}

/// An old and a new tree, each in its own temporary directory
pub struct TreePair {
	pub old: TempDir,
	pub new: TempDir,
}

impl TreePair {
	pub fn new() -> Self {
		Self { old: setup_temp_dir(), new: setup_temp_dir() }
	}

	pub fn old_file(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
		create_test_file(self.old.path(), relative, content)
	}

	pub fn new_file(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
		create_test_file(self.new.path(), relative, content)
	}
}

pub fn default_detector() -> MoveDetector {
	MoveDetector::new(&ReconcileConfig::default()).expect("default configuration is valid")
}

pub fn record(source: &str, destinations: &[(&str, f64)]) -> MoveRecord {
	MoveRecord::new(
		PathBuf::from(source),
		destinations
			.iter()
			.map(|(d, s)| CandidateMatch::new(PathBuf::from(d), SimilarityScore::ratio(*s)))
			.collect(),
	)
}

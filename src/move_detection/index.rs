use crate::error::{ReconcileError, Result};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Basename → directories containing a file with that name, for one root
#[derive(Debug, Default)]
pub struct TreeIndex {
	root: PathBuf,
	by_name: HashMap<OsString, Vec<PathBuf>>,
	file_count: usize,
}

impl TreeIndex {
	/// Walk `root` once and record the directory of every file under it.
	///
	/// Directories are listed in walk order (entries sorted by name). Entries that
	/// cannot be read are logged and skipped.
	pub fn build(root: &Path) -> Result<Self> {
		if !root.is_dir() {
			return Err(ReconcileError::invalid_path(root));
		}

		let mut index = TreeIndex { root: root.to_path_buf(), ..Default::default() };

		for entry in WalkDir::new(root).sort_by_file_name() {
			let entry = match entry {
				Ok(entry) => entry,
				Err(err) => {
					warn!("Skipping unreadable entry while indexing {}: {}", root.display(), err);
					continue;
				}
			};

			if entry.file_type().is_dir() || !entry.path().is_file() {
				continue;
			}

			let dir = entry.path().parent().unwrap_or(root).to_path_buf();
			index.by_name.entry(entry.file_name().to_os_string()).or_default().push(dir);
			index.file_count += 1;
		}

		debug!(
			"Indexed {} files ({} distinct names) under {}",
			index.file_count,
			index.by_name.len(),
			root.display()
		);
		Ok(index)
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Directories that contain `basename`; empty if the name was never seen
	pub fn lookup(&self, basename: &OsStr) -> &[PathBuf] {
		self.by_name.get(basename).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Basenames present in more than one directory, sorted by name
	pub fn shared_names(&self) -> Vec<(&OsStr, &[PathBuf])> {
		let mut shared: Vec<_> = self
			.by_name
			.iter()
			.filter(|(_, dirs)| dirs.len() > 1)
			.map(|(name, dirs)| (name.as_os_str(), dirs.as_slice()))
			.collect();
		shared.sort_by(|a, b| a.0.cmp(b.0));
		shared
	}

	/// Number of files seen during the walk
	pub fn file_count(&self) -> usize {
		self.file_count
	}

	/// Number of distinct basenames
	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}
}

/// Cache of tree indexes keyed by root path
///
/// Owned by the caller; an index is built on first request for a root and reused
/// until it is invalidated. Indexes are handed out behind `Arc` so worker threads
/// can share them read-only.
#[derive(Debug, Default)]
pub struct IndexCache {
	cache: HashMap<PathBuf, Arc<TreeIndex>>,
}

impl IndexCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Get the index for `root`, building it if this root has not been seen
	pub fn get_or_build(&mut self, root: &Path) -> Result<Arc<TreeIndex>> {
		if let Some(index) = self.cache.get(root) {
			return Ok(Arc::clone(index));
		}
		let index = Arc::new(TreeIndex::build(root)?);
		self.cache.insert(root.to_path_buf(), Arc::clone(&index));
		Ok(index)
	}

	/// Directories under `root` containing `basename`
	pub fn lookup(&mut self, root: &Path, basename: &OsStr) -> Result<Vec<PathBuf>> {
		Ok(self.get_or_build(root)?.lookup(basename).to_vec())
	}

	/// Drop the cached index for `root`; returns whether one was cached
	pub fn invalidate(&mut self, root: &Path) -> bool {
		self.cache.remove(root).is_some()
	}

	/// Discard any cached index for `root` and walk it again
	pub fn rebuild(&mut self, root: &Path) -> Result<Arc<TreeIndex>> {
		self.invalidate(root);
		self.get_or_build(root)
	}

	/// Check if an index is cached for `root`
	pub fn contains(&self, root: &Path) -> bool {
		self.cache.contains_key(root)
	}

	pub fn len(&self) -> usize {
		self.cache.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cache.is_empty()
	}

	/// Clear all cached indexes
	pub fn clear(&mut self) {
		self.cache.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	fn tree() -> TempDir {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		fs::create_dir_all(root.join("a/b")).unwrap();
		fs::create_dir_all(root.join("c")).unwrap();
		fs::write(root.join("a/b/Greeting.txt"), "Hello").unwrap();
		fs::write(root.join("c/Greeting.txt"), "Hi").unwrap();
		fs::write(root.join("c/other.txt"), "x").unwrap();
		dir
	}

	#[test]
	fn test_build_and_lookup() {
		let dir = tree();
		let index = TreeIndex::build(dir.path()).unwrap();

		assert_eq!(index.file_count(), 3);
		assert_eq!(index.len(), 2);
		assert_eq!(
			index.lookup(OsStr::new("Greeting.txt")),
			&[dir.path().join("a/b"), dir.path().join("c")]
		);
		assert!(index.lookup(OsStr::new("missing.txt")).is_empty());
	}

	#[test]
	fn test_shared_names() {
		let dir = tree();
		let index = TreeIndex::build(dir.path()).unwrap();
		let shared = index.shared_names();
		assert_eq!(shared.len(), 1);
		assert_eq!(shared[0].0, OsStr::new("Greeting.txt"));
	}

	#[test]
	fn test_build_rejects_missing_root() {
		let err = TreeIndex::build(Path::new("/nonexistent/reorg/root")).unwrap_err();
		assert!(matches!(err, ReconcileError::InvalidPath { .. }));
	}

	#[test]
	fn test_cache_reuses_and_invalidates() {
		let dir = tree();
		let mut cache = IndexCache::new();

		let first = cache.get_or_build(dir.path()).unwrap();
		let second = cache.get_or_build(dir.path()).unwrap();
		assert!(Arc::ptr_eq(&first, &second));
		assert!(cache.contains(dir.path()));

		fs::write(dir.path().join("a/Greeting.txt"), "Hey").unwrap();
		// Stale until rebuilt
		assert_eq!(cache.lookup(dir.path(), OsStr::new("Greeting.txt")).unwrap().len(), 2);

		let rebuilt = cache.rebuild(dir.path()).unwrap();
		assert!(!Arc::ptr_eq(&first, &rebuilt));
		assert_eq!(rebuilt.lookup(OsStr::new("Greeting.txt")).len(), 3);

		assert!(cache.invalidate(dir.path()));
		assert!(!cache.invalidate(dir.path()));
		assert!(cache.is_empty());
	}
}

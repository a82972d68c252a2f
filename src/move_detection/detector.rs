use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, Result};
use crate::move_detection::candidates::CandidateGenerator;
use crate::move_detection::classify::{ContentSniffer, TextClassifier};
use crate::move_detection::index::IndexCache;
use crate::move_detection::similarity::SimilarityScorer;
use crate::progress::ProgressReporter;
use crate::records::{MoveRecord, SimilarityScore};
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub struct MoveDetector {
	generator: CandidateGenerator,
	walk_exclude: Option<Regex>,
	workers: Option<usize>,
}

impl MoveDetector {
	/// Create a detector using the built-in content sniffer as text classifier
	pub fn new(config: &ReconcileConfig) -> Result<Self> {
		Self::with_classifier(config, Arc::new(ContentSniffer::new(config.sniff_bytes)))
	}

	pub fn with_classifier(
		config: &ReconcileConfig, classifier: Arc<dyn TextClassifier>,
	) -> Result<Self> {
		config.validate()?;
		Ok(Self {
			generator: CandidateGenerator::new(classifier, SimilarityScorer::new(config.autojunk)),
			walk_exclude: config.walk_filter()?,
			workers: config.workers,
		})
	}

	pub fn generator(&self) -> &CandidateGenerator {
		&self.generator
	}

	/// Candidates for a single old file
	pub fn detect_move(
		&self, cache: &mut IndexCache, new_root: &Path, old_file: &Path,
	) -> Result<MoveRecord> {
		if !old_file.is_file() {
			return Err(ReconcileError::invalid_path(old_file));
		}
		let index = cache.get_or_build(new_root)?;
		Ok(self.generator.detect_move(&index, old_file))
	}

	/// One record per file under `old_root`, in walk order.
	///
	/// Scoring runs on a worker pool; results come back in walk order regardless of
	/// which worker finished first. Unreadable entries are logged and skipped.
	pub fn detect_moves(
		&self, cache: &mut IndexCache, new_root: &Path, old_root: &Path,
		reporter: &dyn ProgressReporter,
	) -> Result<Vec<MoveRecord>> {
		let start = Instant::now();
		let index = cache.get_or_build(new_root)?;
		let files = self.old_tree_files(old_root, reporter)?;
		let total = files.len();
		info!(
			"Scoring {} files from {} against {} ({} names indexed)",
			total,
			old_root.display(),
			new_root.display(),
			index.len()
		);

		let pool = build_pool(self.workers)?;
		let done = AtomicUsize::new(0);
		let records: Vec<MoveRecord> = pool.install(|| {
			files
				.par_iter()
				.map(|file| {
					let record = self.generator.detect_move(&index, file);
					reporter.on_file_scored(done.fetch_add(1, Ordering::Relaxed) + 1, total);
					record
				})
				.collect()
		});

		let stats = DetectionStats::from_records(&records);
		let elapsed = start.elapsed().as_secs_f64();
		reporter.on_walk_complete(records.len(), elapsed);
		info!(
			"Move detection finished in {:.2}s: {} files, {} identical, {} unmatched, {} not comparable",
			elapsed, stats.files, stats.identical, stats.unmatched, stats.not_comparable
		);
		Ok(records)
	}

	/// Files under `old_root` in depth-first order, entries sorted by name,
	/// skipping directories matched by the walk filter.
	///
	/// The filter sees directory paths relative to `old_root`, so the root itself
	/// and the components above it never match.
	pub fn old_tree_files(
		&self, old_root: &Path, reporter: &dyn ProgressReporter,
	) -> Result<Vec<PathBuf>> {
		if !old_root.is_dir() {
			return Err(ReconcileError::invalid_path(old_root));
		}
		reporter.on_walk_start(old_root);

		let exclude = self.walk_exclude.as_ref();
		let walker = WalkDir::new(old_root).sort_by_file_name().into_iter().filter_entry(|entry| {
			let skip = entry.depth() > 0
				&& entry.file_type().is_dir()
				&& exclude.is_some_and(|re| {
					let relative = entry.path().strip_prefix(old_root).unwrap_or(entry.path());
					re.is_match(&relative.to_string_lossy())
				});
			if skip {
				debug!("Skipping excluded directory {}", entry.path().display());
			}
			!skip
		});

		let mut files = Vec::new();
		for entry in walker {
			let entry = match entry {
				Ok(entry) => entry,
				Err(err) => {
					warn!(category = "file_unreadable", "Skipping entry under {}: {}", old_root.display(), err);
					continue;
				}
			};
			if entry.file_type().is_dir() {
				reporter.on_directory(entry.path());
			} else if entry.path().is_file() {
				files.push(entry.into_path());
			}
		}
		Ok(files)
	}
}

fn build_pool(workers: Option<usize>) -> Result<rayon::ThreadPool> {
	rayon::ThreadPoolBuilder::new()
		.num_threads(workers.unwrap_or(0))
		.build()
		.map_err(|e| ReconcileError::configuration_error("workers", &e.to_string()))
}

/// Summary counts over a set of move records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionStats {
	pub files: usize,
	pub unmatched: usize,
	pub ambiguous: usize,
	pub identical: usize,
	pub not_comparable: usize,
	pub candidates: usize,
}

impl DetectionStats {
	pub fn from_records(records: &[MoveRecord]) -> Self {
		let mut stats = DetectionStats { files: records.len(), ..Default::default() };
		for record in records {
			stats.candidates += record.candidates.len();
			match record.best() {
				None => stats.unmatched += 1,
				Some(best) if best.score == SimilarityScore::IDENTICAL => stats.identical += 1,
				Some(best) if !best.score.is_comparable() => stats.not_comparable += 1,
				Some(_) => {}
			}
			if record.candidates.len() > 1 {
				stats.ambiguous += 1;
			}
		}
		stats
	}
}

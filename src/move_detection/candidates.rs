use crate::error::ReconcileError;
use crate::move_detection::classify::TextClassifier;
use crate::move_detection::index::TreeIndex;
use crate::move_detection::similarity::{PreparedContent, Scored, SimilarityScorer};
use crate::records::{CandidateMatch, MoveRecord};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds same-named files in the new tree and scores them against an old file
#[derive(Clone)]
pub struct CandidateGenerator {
	classifier: Arc<dyn TextClassifier>,
	scorer: SimilarityScorer,
}

impl CandidateGenerator {
	pub fn new(classifier: Arc<dyn TextClassifier>, scorer: SimilarityScorer) -> Self {
		Self { classifier, scorer }
	}

	/// Candidates for `old_file` in the tree behind `index`, best first.
	///
	/// No same-named file is a valid outcome and yields an empty list. Files that are
	/// binary or unreadable on either side are listed with a score of -1.
	pub fn find_candidates(&self, index: &TreeIndex, old_file: &Path) -> Vec<CandidateMatch> {
		let Some(name) = old_file.file_name() else {
			return Vec::new();
		};
		let dirs = index.lookup(name);
		if dirs.is_empty() {
			debug!("No candidates for {}", old_file.display());
			return Vec::new();
		}

		let source = self.load_text(old_file);
		let mut candidates: Vec<CandidateMatch> = dirs
			.iter()
			.map(|dir| {
				let destination = dir.join(name);
				let scored = match &source {
					Some(source) => self.score_candidate(source, &destination),
					None => Scored::not_comparable(),
				};
				debug!(
					"{} -> {}: {} ({:?})",
					old_file.display(),
					destination.display(),
					scored.score,
					scored.method
				);
				CandidateMatch::new(destination, scored.score)
			})
			.collect();

		crate::records::rank_candidates(&mut candidates);
		candidates
	}

	/// Wrap [`CandidateGenerator::find_candidates`] into a record
	pub fn detect_move(&self, index: &TreeIndex, old_file: &Path) -> MoveRecord {
		MoveRecord::new(old_file.to_path_buf(), self.find_candidates(index, old_file))
	}

	/// Score one candidate against already-loaded source content
	pub fn score_candidate(&self, source: &PreparedContent, candidate: &Path) -> Scored {
		match self.load_text(candidate) {
			Some(content) => self.scorer.score_prepared(source, &content),
			None => Scored::not_comparable(),
		}
	}

	/// Read a text-like file; `None` for binary or unreadable files
	pub(crate) fn load_text(&self, path: &Path) -> Option<PreparedContent> {
		if !self.classifier.is_text_like(path) {
			return None;
		}
		match PreparedContent::from_file(path) {
			Ok(content) => Some(content),
			Err(err) => {
				let err = ReconcileError::file_unreadable(path, &err);
				warn!(category = err.category(), "{}", err);
				None
			}
		}
	}

	pub fn classifier(&self) -> &dyn TextClassifier {
		self.classifier.as_ref()
	}

	pub fn scorer(&self) -> &SimilarityScorer {
		&self.scorer
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::move_detection::classify::ContentSniffer;
	use crate::records::SimilarityScore;
	use std::fs;
	use tempfile::TempDir;

	fn generator() -> CandidateGenerator {
		CandidateGenerator::new(Arc::new(ContentSniffer::default()), SimilarityScorer::default())
	}

	#[test]
	fn test_no_same_named_file() {
		let old = TempDir::new().unwrap();
		let new = TempDir::new().unwrap();
		fs::write(old.path().join("lonely.txt"), "alone").unwrap();
		fs::write(new.path().join("other.txt"), "alone").unwrap();

		let index = TreeIndex::build(new.path()).unwrap();
		let candidates = generator().find_candidates(&index, &old.path().join("lonely.txt"));
		assert!(candidates.is_empty());
	}

	#[test]
	fn test_candidates_ranked_by_similarity() {
		let old = TempDir::new().unwrap();
		let new = TempDir::new().unwrap();
		fs::create_dir_all(new.path().join("a")).unwrap();
		fs::create_dir_all(new.path().join("b")).unwrap();
		fs::write(old.path().join("notes.txt"), "alpha beta gamma delta").unwrap();
		fs::write(new.path().join("a/notes.txt"), "something else entirely").unwrap();
		fs::write(new.path().join("b/notes.txt"), "alpha beta gamma delta").unwrap();

		let index = TreeIndex::build(new.path()).unwrap();
		let candidates = generator().find_candidates(&index, &old.path().join("notes.txt"));

		assert_eq!(candidates.len(), 2);
		assert_eq!(candidates[0].destination, new.path().join("b/notes.txt"));
		assert_eq!(candidates[0].score, SimilarityScore::IDENTICAL);
		assert!(candidates[1].score.value() < 1.0);
	}

	#[test]
	fn test_binary_source_is_not_comparable() {
		let old = TempDir::new().unwrap();
		let new = TempDir::new().unwrap();
		fs::write(old.path().join("blob.dat"), [0u8, 1, 2, 3]).unwrap();
		fs::write(new.path().join("blob.dat"), "now it is text").unwrap();

		let index = TreeIndex::build(new.path()).unwrap();
		let record = generator().detect_move(&index, &old.path().join("blob.dat"));
		assert_eq!(record.candidates.len(), 1);
		assert_eq!(record.candidates[0].score, SimilarityScore::NOT_COMPARABLE);
	}
}

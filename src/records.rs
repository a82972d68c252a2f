use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// Edit-similarity ratio in `[0, 1]`, or exactly `-1` for "not comparable"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimilarityScore(f64);

impl SimilarityScore {
	pub const IDENTICAL: SimilarityScore = SimilarityScore(1.0);
	pub const NOT_COMPARABLE: SimilarityScore = SimilarityScore(-1.0);

	/// Clamp a ratio into `[0, 1]`; use [`SimilarityScore::NOT_COMPARABLE`] for the sentinel.
	pub fn ratio(value: f64) -> Self {
		if value.is_nan() {
			return Self::NOT_COMPARABLE;
		}
		SimilarityScore(value.clamp(0.0, 1.0))
	}

	pub fn value(self) -> f64 {
		self.0
	}

	pub fn is_comparable(self) -> bool {
		self.0 >= 0.0
	}

	/// Ordering used for ranking: higher first, not comparable last.
	pub fn rank_cmp(self, other: Self) -> Ordering {
		other.0.total_cmp(&self.0)
	}
}

impl fmt::Display for SimilarityScore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_comparable() {
			write!(f, "{:.4}", self.0)
		} else {
			write!(f, "n/a")
		}
	}
}

/// How a similarity score was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreMethod {
	/// Byte-identical content, found by the digest fast path
	Identical,
	/// Sequence-matching ratio over the text contents
	SequenceRatio,
	/// At least one side was binary, unreadable or missing
	NotComparable,
}

/// A possible new location for an old file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
	pub destination: PathBuf,
	pub score: SimilarityScore,
}

impl CandidateMatch {
	pub fn new(destination: PathBuf, score: SimilarityScore) -> Self {
		Self { destination, score }
	}
}

/// All candidates for one old-tree file, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
	pub source: PathBuf,
	pub candidates: Vec<CandidateMatch>,
}

impl MoveRecord {
	/// Build a record, ranking candidates by descending score.
	///
	/// The sort is stable, so equal scores keep the order they were found in.
	pub fn new(source: PathBuf, mut candidates: Vec<CandidateMatch>) -> Self {
		rank_candidates(&mut candidates);
		Self { source, candidates }
	}

	pub fn best(&self) -> Option<&CandidateMatch> {
		self.candidates.first()
	}

	pub fn is_unmatched(&self) -> bool {
		self.candidates.is_empty()
	}
}

/// Stable descending sort by score
pub fn rank_candidates(candidates: &mut [CandidateMatch]) {
	candidates.sort_by(|a, b| a.score.rank_cmp(b.score));
}

/// Where a pick came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickKind {
	/// Decided by the picker (interactive or automatic)
	#[default]
	Picked,
	/// Elected as the winner of a duplicate-target contest
	Resolved,
	/// A new-tree file with no old-tree counterpart; `source` holds the new path
	Added,
}

/// A final decision for one old-tree file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickRecord {
	pub source: PathBuf,
	pub destination: Option<PathBuf>,
	pub score: SimilarityScore,
	#[serde(default)]
	pub kind: PickKind,
}

impl PickRecord {
	pub fn accepted(source: PathBuf, candidate: &CandidateMatch) -> Self {
		Self {
			source,
			destination: Some(candidate.destination.clone()),
			score: candidate.score,
			kind: PickKind::Picked,
		}
	}

	pub fn none(source: PathBuf) -> Self {
		Self {
			source,
			destination: None,
			score: SimilarityScore::NOT_COMPARABLE,
			kind: PickKind::Picked,
		}
	}

	pub fn resolved(source: PathBuf, destination: PathBuf, score: SimilarityScore) -> Self {
		Self { source, destination: Some(destination), score, kind: PickKind::Resolved }
	}

	pub fn added(new_path: PathBuf) -> Self {
		Self {
			source: new_path,
			destination: None,
			score: SimilarityScore::NOT_COMPARABLE,
			kind: PickKind::Added,
		}
	}

	/// The (old, new) sides of this pick as the diff renderer sees them
	pub fn sides(&self) -> (Option<&Path>, Option<&Path>) {
		match self.kind {
			PickKind::Added => (None, Some(self.source.as_path())),
			_ => (Some(self.source.as_path()), self.destination.as_deref()),
		}
	}
}

/// One contributor to a duplicate target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMember {
	pub source: PathBuf,
	pub score: SimilarityScore,
}

/// Several old files claiming the same new destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
	pub destination: PathBuf,
	pub members: Vec<DuplicateMember>,
}

impl DuplicateGroup {
	/// A group only matters once two or more sources claim the destination
	pub fn is_material(&self) -> bool {
		self.members.len() >= 2
	}
}

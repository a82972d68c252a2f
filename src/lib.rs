pub mod config;
pub mod diff;
pub mod duplicates;
mod error;
pub mod filter;
pub mod move_detection;
pub mod picker;
pub mod progress;
mod records;
pub mod state;

pub use config::ReconcileConfig;
pub use diff::{render_diff, render_pick_diffs};
pub use duplicates::{
	find_duplicate_targets, resolve_all, resolve_duplicates, retract_superseded_picks, Resolution,
	Retraction,
};
pub use error::{ReconcileError, Result};
pub use filter::{average_ratio, filter_picks, reconcile_adds_and_deletes, PickFilter, PickStats};
pub use move_detection::{
	find_name_collisions, CandidateGenerator, ContentSniffer, DetectionStats, IndexCache,
	MoveDetector, NameCollision, SimilarityScorer, TextClassifier, TreeIndex,
};
pub use picker::{run_picker, ActionSource, AutoPolicy, DiffLauncher, PickAction, PickOutcome};
pub use progress::{ProgressReporter, SilentReporter};
pub use records::{
	CandidateMatch, DuplicateGroup, DuplicateMember, MoveRecord, PickKind, PickRecord,
	ScoreMethod, SimilarityScore,
};

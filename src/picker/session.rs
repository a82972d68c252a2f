use crate::picker::input::ActionSource;
use crate::picker::launcher::DiffLauncher;
use crate::records::{CandidateMatch, MoveRecord, PickRecord};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Actions a reviewer (or a policy) can take on the current candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickAction {
	Accept,
	Reject,
	Next,
	Previous,
	Diff,
	/// Leave this source undecided and move on to the next one
	Continue,
	/// Stop picking altogether
	Cancel,
}

/// Result of applying one action to a session
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
	/// Still deciding
	Pending,
	Decided(PickRecord),
	/// Show a diff of the pair, then keep deciding
	LaunchDiff { source: PathBuf, destination: PathBuf },
	Skipped,
	Cancelled,
}

/// Read-only view of a session for action sources
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
	pub source: &'a Path,
	pub candidates: &'a [CandidateMatch],
	pub cursor: usize,
}

impl<'a> SessionView<'a> {
	pub fn current(&self) -> Option<&'a CandidateMatch> {
		self.candidates.get(self.cursor)
	}
}

/// Disambiguation state for one old file: its remaining candidates and a cursor
#[derive(Debug, Clone)]
pub struct PickerSession {
	source: PathBuf,
	candidates: Vec<CandidateMatch>,
	cursor: usize,
}

impl PickerSession {
	pub fn new(record: MoveRecord) -> Self {
		Self { source: record.source, candidates: record.candidates, cursor: 0 }
	}

	pub fn source(&self) -> &Path {
		&self.source
	}

	pub fn candidates(&self) -> &[CandidateMatch] {
		&self.candidates
	}

	pub fn cursor(&self) -> usize {
		self.cursor
	}

	pub fn current(&self) -> Option<&CandidateMatch> {
		self.candidates.get(self.cursor)
	}

	pub fn view(&self) -> SessionView<'_> {
		SessionView { source: &self.source, candidates: &self.candidates, cursor: self.cursor }
	}

	/// Apply one action and report what happened
	pub fn apply(&mut self, action: PickAction) -> Step {
		match action {
			PickAction::Cancel => Step::Cancelled,
			PickAction::Continue => Step::Skipped,
			_ if self.candidates.is_empty() => self.decide_none(),
			PickAction::Accept => {
				let candidate = &self.candidates[self.cursor];
				Step::Decided(PickRecord::accepted(self.source.clone(), candidate))
			}
			PickAction::Reject => {
				let rejected = self.candidates.remove(self.cursor);
				debug!("Rejected {} for {}", rejected.destination.display(), self.source.display());
				if self.candidates.is_empty() {
					return self.decide_none();
				}
				self.cursor %= self.candidates.len();
				Step::Pending
			}
			PickAction::Next => {
				self.cursor = (self.cursor + 1) % self.candidates.len();
				Step::Pending
			}
			PickAction::Previous => {
				let len = self.candidates.len();
				self.cursor = (self.cursor + len - 1) % len;
				Step::Pending
			}
			PickAction::Diff => Step::LaunchDiff {
				source: self.source.clone(),
				destination: self.candidates[self.cursor].destination.clone(),
			},
		}
	}

	fn decide_none(&self) -> Step {
		warn!("No destination left for {}, recording none", self.source.display());
		Step::Decided(PickRecord::none(self.source.clone()))
	}
}

/// What a picking run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickOutcome {
	/// Prior decisions carried over, followed by the decisions made in this run
	pub picks: Vec<PickRecord>,
	/// Sources left undecided with `Continue`
	pub skipped: Vec<PathBuf>,
	/// Number of sources skipped because a prior decision existed
	pub resumed: usize,
	pub cancelled: bool,
	/// Why the action source stopped answering, if it failed
	pub failure: Option<String>,
}

/// Drive one session per record until each is decided, skipped, or the run is cancelled.
///
/// Sources that already have a pick in `prior` are not asked about again. A record
/// without candidates is decided as none without consulting `actions`. On
/// cancellation, or when `actions` fails, every pick finalized so far is returned.
pub fn run_picker(
	records: &[MoveRecord], actions: &mut dyn ActionSource, launcher: &dyn DiffLauncher,
	prior: &[PickRecord],
) -> PickOutcome {
	let decided: HashSet<&Path> = prior.iter().map(|pick| pick.source.as_path()).collect();
	let mut outcome = PickOutcome { picks: prior.to_vec(), ..Default::default() };

	'records: for record in records {
		if decided.contains(record.source.as_path()) {
			outcome.resumed += 1;
			continue;
		}

		let mut session = PickerSession::new(record.clone());
		if session.candidates().is_empty() {
			if let Step::Decided(pick) = session.apply(PickAction::Accept) {
				outcome.picks.push(pick);
			}
			continue;
		}

		loop {
			let action = match actions.next_action(&session.view()) {
				Ok(action) => action,
				Err(err) => {
					warn!(
						category = err.category(),
						"Stopped picking at {}: {}",
						record.source.display(),
						err
					);
					outcome.failure = Some(err.to_string());
					break 'records;
				}
			};
			match session.apply(action) {
				Step::Pending => {}
				Step::Decided(pick) => {
					outcome.picks.push(pick);
					continue 'records;
				}
				Step::LaunchDiff { source, destination } => {
					if let Err(err) = launcher.launch(&source, &destination) {
						warn!("Diff tool failed for {}: {}", source.display(), err);
					}
				}
				Step::Skipped => {
					outcome.skipped.push(record.source.clone());
					continue 'records;
				}
				Step::Cancelled => {
					outcome.cancelled = true;
					break 'records;
				}
			}
		}
	}

	let status = match (&outcome.failure, outcome.cancelled) {
		(Some(_), _) => "failed",
		(None, true) => "cancelled",
		(None, false) => "finished",
	};
	info!(
		"Picking {}: {} picks, {} skipped, {} carried over",
		status,
		outcome.picks.len(),
		outcome.skipped.len(),
		outcome.resumed
	);
	outcome
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::picker::input::ScriptedActions;
	use crate::picker::launcher::NoDiffTool;
	use crate::records::SimilarityScore;

	fn record(source: &str, destinations: &[(&str, f64)]) -> MoveRecord {
		MoveRecord::new(
			PathBuf::from(source),
			destinations
				.iter()
				.map(|(d, s)| CandidateMatch::new(PathBuf::from(d), SimilarityScore::ratio(*s)))
				.collect(),
		)
	}

	#[test]
	fn test_accept_first_candidate() {
		let mut session = PickerSession::new(record("old/a", &[("new/x", 0.9), ("new/y", 0.5)]));
		match session.apply(PickAction::Accept) {
			Step::Decided(pick) => assert_eq!(pick.destination, Some(PathBuf::from("new/x"))),
			other => panic!("unexpected step {:?}", other),
		}
	}

	#[test]
	fn test_cursor_wraps_both_ways() {
		let mut session = PickerSession::new(record(
			"old/a",
			&[("new/x", 0.9), ("new/y", 0.5), ("new/z", 0.1)],
		));
		assert_eq!(session.apply(PickAction::Previous), Step::Pending);
		assert_eq!(session.cursor(), 2);
		assert_eq!(session.apply(PickAction::Next), Step::Pending);
		assert_eq!(session.cursor(), 0);
	}

	#[test]
	fn test_reject_at_end_clamps_cursor() {
		let mut session = PickerSession::new(record("old/a", &[("new/x", 0.9), ("new/y", 0.5)]));
		session.apply(PickAction::Next);
		assert_eq!(session.apply(PickAction::Reject), Step::Pending);
		assert_eq!(session.cursor(), 0);
		assert_eq!(session.current().unwrap().destination, PathBuf::from("new/x"));
	}

	#[test]
	fn test_rejecting_everything_records_none() {
		let mut session = PickerSession::new(record("old/a", &[("new/x", 0.9)]));
		assert_eq!(
			session.apply(PickAction::Reject),
			Step::Decided(PickRecord::none(PathBuf::from("old/a")))
		);
	}

	#[test]
	fn test_diff_does_not_change_state() {
		let mut session = PickerSession::new(record("old/a", &[("new/x", 0.9), ("new/y", 0.5)]));
		session.apply(PickAction::Next);
		assert_eq!(
			session.apply(PickAction::Diff),
			Step::LaunchDiff { source: PathBuf::from("old/a"), destination: PathBuf::from("new/y") }
		);
		assert_eq!(session.cursor(), 1);
		assert_eq!(session.candidates().len(), 2);
	}

	#[test]
	fn test_run_without_candidates_needs_no_input() {
		let records = vec![record("old/a", &[])];
		let mut actions = ScriptedActions::new(Vec::new());
		let outcome = run_picker(&records, &mut actions, &NoDiffTool, &[]);
		assert_eq!(outcome.picks, vec![PickRecord::none(PathBuf::from("old/a"))]);
		assert!(!outcome.cancelled);
	}

	#[test]
	fn test_cancel_keeps_finalized_picks() {
		let records = vec![
			record("old/a", &[("new/a", 1.0)]),
			record("old/b", &[("new/b", 0.8)]),
			record("old/c", &[("new/c", 0.7)]),
		];
		let mut actions =
			ScriptedActions::new(vec![PickAction::Accept, PickAction::Next, PickAction::Cancel]);
		let outcome = run_picker(&records, &mut actions, &NoDiffTool, &[]);
		assert!(outcome.cancelled);
		assert_eq!(outcome.picks.len(), 1);
		assert_eq!(outcome.picks[0].source, PathBuf::from("old/a"));
	}

	#[test]
	fn test_continue_and_resume() {
		let records = vec![
			record("old/a", &[("new/a", 1.0)]),
			record("old/b", &[("new/b", 0.8)]),
			record("old/c", &[("new/c", 0.7)]),
		];
		let prior = vec![PickRecord::none(PathBuf::from("old/a"))];
		let mut actions = ScriptedActions::new(vec![PickAction::Continue, PickAction::Accept]);
		let outcome = run_picker(&records, &mut actions, &NoDiffTool, &prior);

		assert_eq!(outcome.resumed, 1);
		assert_eq!(outcome.skipped, vec![PathBuf::from("old/b")]);
		let sources: Vec<_> = outcome.picks.iter().map(|p| p.source.clone()).collect();
		assert_eq!(sources, vec![PathBuf::from("old/a"), PathBuf::from("old/c")]);
	}

	#[test]
	fn test_failing_action_source_keeps_picks() {
		struct FailsAfter(usize);

		impl ActionSource for FailsAfter {
			fn next_action(&mut self, _view: &SessionView<'_>) -> crate::error::Result<PickAction> {
				if self.0 == 0 {
					return Err(std::io::Error::other("terminal went away").into());
				}
				self.0 -= 1;
				Ok(PickAction::Accept)
			}
		}

		let records = vec![
			record("old/a", &[("new/a", 1.0)]),
			record("old/b", &[("new/b", 0.8)]),
		];
		let outcome = run_picker(&records, &mut FailsAfter(1), &NoDiffTool, &[]);

		assert!(!outcome.cancelled);
		assert_eq!(outcome.picks.len(), 1);
		assert_eq!(outcome.picks[0].source, PathBuf::from("old/a"));
		assert!(outcome.failure.unwrap().contains("terminal went away"));
	}
}

use crate::error::{ReconcileError, Result};
use crate::picker::session::{PickAction, SessionView};
use crate::records::SimilarityScore;
use console::{style, Key, Term};
use std::collections::VecDeque;
use tracing::debug;

/// Where picker actions come from
pub trait ActionSource {
	fn next_action(&mut self, view: &SessionView<'_>) -> Result<PickAction>;
}

/// A fixed queue of actions; cancels once the queue runs dry
#[derive(Debug, Clone, Default)]
pub struct ScriptedActions {
	queue: VecDeque<PickAction>,
}

impl ScriptedActions {
	pub fn new(actions: impl IntoIterator<Item = PickAction>) -> Self {
		Self { queue: actions.into_iter().collect() }
	}

	pub fn remaining(&self) -> usize {
		self.queue.len()
	}
}

impl ActionSource for ScriptedActions {
	fn next_action(&mut self, _view: &SessionView<'_>) -> Result<PickAction> {
		Ok(self.queue.pop_front().unwrap_or(PickAction::Cancel))
	}
}

/// Accepts the current candidate when it scores at least `threshold`, rejects it otherwise
#[derive(Debug, Clone, Copy)]
pub struct AutoPolicy {
	threshold: f64,
}

impl AutoPolicy {
	pub fn new(threshold: f64) -> Self {
		Self { threshold }
	}
}

impl ActionSource for AutoPolicy {
	fn next_action(&mut self, view: &SessionView<'_>) -> Result<PickAction> {
		let action = match view.current() {
			Some(candidate)
				if candidate.score.is_comparable() && candidate.score.value() >= self.threshold =>
			{
				PickAction::Accept
			}
			_ => PickAction::Reject,
		};
		debug!("{} -> {:?}", view.source.display(), action);
		Ok(action)
	}
}

/// Source of single keystrokes
pub trait KeyReader {
	/// Whether someone can answer; an unattended reader never yields a bound key
	fn is_attended(&self) -> bool;
	fn next_key(&mut self) -> std::io::Result<Key>;
}

impl KeyReader for Term {
	fn is_attended(&self) -> bool {
		self.is_term()
	}

	// Raw mode hands Ctrl-C back as a key instead of raising SIGINT
	fn next_key(&mut self) -> std::io::Result<Key> {
		self.read_key_raw()
	}
}

/// Reads single keystrokes from the terminal
pub struct TerminalActions<R: KeyReader = Term> {
	output: Term,
	keys: R,
}

impl TerminalActions<Term> {
	pub fn new() -> Self {
		Self::with_reader(Term::stdout())
	}
}

impl<R: KeyReader> TerminalActions<R> {
	pub fn with_reader(keys: R) -> Self {
		Self { output: Term::stdout(), keys }
	}

	fn render(&self, view: &SessionView<'_>) -> Result<()> {
		self.output.write_line("")?;
		self.output.write_line(&format!("{}", style(view.source.display()).bold()))?;
		for (i, candidate) in view.candidates.iter().enumerate() {
			let marker = if i == view.cursor { ">" } else { " " };
			let score = format_score(candidate.score);
			let line = format!("{} {} {}", marker, score, candidate.destination.display());
			if i == view.cursor {
				self.output.write_line(&format!("{}", style(line).green()))?;
			} else {
				self.output.write_line(&line)?;
			}
		}
		self.output.write_line(
			"[a]ccept [r]eject [n]ext [p]revious [d]iff [c]ontinue [q]uit",
		)?;
		Ok(())
	}
}

impl Default for TerminalActions {
	fn default() -> Self {
		Self::new()
	}
}

fn format_score(score: SimilarityScore) -> String {
	format!("{:>6}", score.to_string())
}

/// Map a keystroke to an action; `None` for keys with no binding
pub fn action_for_key(key: &Key) -> Option<PickAction> {
	match key {
		Key::Char('a') | Key::Enter => Some(PickAction::Accept),
		Key::Char('r') | Key::Del | Key::Backspace => Some(PickAction::Reject),
		Key::Char('n') | Key::ArrowDown | Key::ArrowRight | Key::Tab => Some(PickAction::Next),
		Key::Char('p') | Key::ArrowUp | Key::ArrowLeft | Key::BackTab => Some(PickAction::Previous),
		Key::Char('d') => Some(PickAction::Diff),
		Key::Char('c') => Some(PickAction::Continue),
		Key::Char('q') | Key::Escape | Key::CtrlC => Some(PickAction::Cancel),
		_ => None,
	}
}

impl<R: KeyReader> ActionSource for TerminalActions<R> {
	fn next_action(&mut self, view: &SessionView<'_>) -> Result<PickAction> {
		if !self.keys.is_attended() {
			return Err(ReconcileError::configuration_error(
				"terminal",
				"not attached to a terminal, use automatic picking instead",
			));
		}
		self.render(view)?;
		loop {
			let key = self.keys.next_key()?;
			if let Some(action) = action_for_key(&key) {
				return Ok(action);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::records::CandidateMatch;
	use std::path::{Path, PathBuf};

	struct QueuedKeys {
		attended: bool,
		keys: VecDeque<Key>,
	}

	impl QueuedKeys {
		fn new(attended: bool, keys: Vec<Key>) -> Self {
			Self { attended, keys: keys.into() }
		}
	}

	impl KeyReader for QueuedKeys {
		fn is_attended(&self) -> bool {
			self.attended
		}

		fn next_key(&mut self) -> std::io::Result<Key> {
			self.keys.pop_front().ok_or_else(|| std::io::ErrorKind::UnexpectedEof.into())
		}
	}

	fn candidates() -> Vec<CandidateMatch> {
		vec![
			CandidateMatch::new(PathBuf::from("new/x"), SimilarityScore::ratio(0.8)),
			CandidateMatch::new(PathBuf::from("new/y"), SimilarityScore::ratio(0.3)),
			CandidateMatch::new(PathBuf::from("new/z"), SimilarityScore::NOT_COMPARABLE),
		]
	}

	#[test]
	fn test_scripted_actions_cancel_when_exhausted() {
		let candidates = candidates();
		let view = SessionView { source: Path::new("old/a"), candidates: &candidates, cursor: 0 };
		let mut actions = ScriptedActions::new(vec![PickAction::Next]);
		assert_eq!(actions.next_action(&view).unwrap(), PickAction::Next);
		assert_eq!(actions.remaining(), 0);
		assert_eq!(actions.next_action(&view).unwrap(), PickAction::Cancel);
	}

	#[test]
	fn test_auto_policy_threshold() {
		let candidates = candidates();
		let mut policy = AutoPolicy::new(0.5);
		for (cursor, expected) in
			[(0, PickAction::Accept), (1, PickAction::Reject), (2, PickAction::Reject)]
		{
			let view = SessionView { source: Path::new("old/a"), candidates: &candidates, cursor };
			assert_eq!(policy.next_action(&view).unwrap(), expected);
		}
	}

	#[test]
	fn test_auto_policy_never_accepts_not_comparable() {
		let candidates = candidates();
		let view = SessionView { source: Path::new("old/a"), candidates: &candidates, cursor: 2 };
		assert_eq!(AutoPolicy::new(0.0).next_action(&view).unwrap(), PickAction::Reject);
	}

	#[test]
	fn test_key_bindings() {
		assert_eq!(action_for_key(&Key::Char('a')), Some(PickAction::Accept));
		assert_eq!(action_for_key(&Key::ArrowUp), Some(PickAction::Previous));
		assert_eq!(action_for_key(&Key::CtrlC), Some(PickAction::Cancel));
		assert_eq!(action_for_key(&Key::Char('z')), None);
	}

	#[test]
	fn test_terminal_ctrl_c_cancels() {
		let candidates = candidates();
		let view = SessionView { source: Path::new("old/a"), candidates: &candidates, cursor: 0 };
		let keys = QueuedKeys::new(true, vec![Key::Char('z'), Key::Unknown, Key::CtrlC]);
		let mut terminal = TerminalActions::with_reader(keys);

		assert_eq!(terminal.next_action(&view).unwrap(), PickAction::Cancel);
		assert!(terminal.keys.keys.is_empty());
	}

	#[test]
	fn test_terminal_read_failure_is_reported() {
		let candidates = candidates();
		let view = SessionView { source: Path::new("old/a"), candidates: &candidates, cursor: 0 };
		let mut terminal = TerminalActions::with_reader(QueuedKeys::new(true, vec![Key::Home]));
		assert!(matches!(terminal.next_action(&view), Err(ReconcileError::Io(_))));
	}

	#[test]
	fn test_unattended_terminal_refuses_to_wait() {
		let candidates = candidates();
		let view = SessionView { source: Path::new("old/a"), candidates: &candidates, cursor: 0 };
		let mut terminal = TerminalActions::with_reader(QueuedKeys::new(false, vec![Key::Char('a')]));

		let result = terminal.next_action(&view);
		assert!(matches!(result, Err(ReconcileError::ConfigurationError { .. })));
		assert_eq!(terminal.keys.keys.len(), 1);
	}
}

//! Candidate disambiguation
//!
//! Each move record gets a [`PickerSession`], a small state machine over its ranked
//! candidates. Actions come from an [`ActionSource`]: a terminal, a threshold
//! policy, or a scripted queue.

pub mod input;
pub mod launcher;
pub mod session;

pub use input::{action_for_key, ActionSource, AutoPolicy, ScriptedActions, TerminalActions};
pub use launcher::{DiffLauncher, ExternalDiffTool, NoDiffTool};
pub use session::{run_picker, PickAction, PickOutcome, PickerSession, SessionView, Step};

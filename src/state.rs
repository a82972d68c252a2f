//! On-disk pipeline state
//!
//! Every stage reads the previous stage's output and writes its own, so each
//! stage can be rerun on its own. Files are pretty-printed JSON wrapped in a
//! small envelope naming the format version and what the entries are.

use crate::error::{ReconcileError, Result};
use crate::records::{DuplicateGroup, MoveRecord, PickRecord};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const STATE_VERSION: u32 = 1;

/// What a state file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
	Moves,
	Picks,
	Duplicates,
}

impl fmt::Display for StateKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StateKind::Moves => write!(f, "moves"),
			StateKind::Picks => write!(f, "picks"),
			StateKind::Duplicates => write!(f, "duplicates"),
		}
	}
}

/// A value that can be stored as pipeline state
pub trait StateValue: Serialize + DeserializeOwned {
	const KIND: StateKind;
}

impl StateValue for Vec<MoveRecord> {
	const KIND: StateKind = StateKind::Moves;
}

impl StateValue for Vec<PickRecord> {
	const KIND: StateKind = StateKind::Picks;
}

impl StateValue for Vec<DuplicateGroup> {
	const KIND: StateKind = StateKind::Duplicates;
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
	version: u32,
	kind: StateKind,
	entries: &'a T,
}

#[derive(Deserialize)]
struct Header {
	version: u32,
	kind: StateKind,
}

#[derive(Deserialize)]
struct EnvelopeIn<T> {
	entries: T,
}

/// Serialize `value` to a string in the state file format
pub fn to_state_string<T: StateValue>(value: &T) -> Result<String> {
	let envelope = EnvelopeOut { version: STATE_VERSION, kind: T::KIND, entries: value };
	let mut text = serde_json::to_string_pretty(&envelope)?;
	text.push('\n');
	Ok(text)
}

/// Parse state file text. `path` is only used for diagnostics.
pub fn from_state_str<T: StateValue>(path: &Path, text: &str) -> Result<T> {
	let header: Header = serde_json::from_str(text)
		.map_err(|e| ReconcileError::malformed_state(path, e.to_string()))?;
	if header.version != STATE_VERSION {
		return Err(ReconcileError::UnsupportedStateVersion {
			path: path.display().to_string(),
			found: header.version,
			expected: STATE_VERSION,
		});
	}
	if header.kind != T::KIND {
		return Err(ReconcileError::malformed_state(
			path,
			format!("expected {} but file holds {}", T::KIND, header.kind),
		));
	}
	let envelope: EnvelopeIn<T> = serde_json::from_str(text)
		.map_err(|e| ReconcileError::malformed_state(path, e.to_string()))?;
	Ok(envelope.entries)
}

/// Write `value` to `path` atomically.
///
/// The content is written to a temporary file next to `path` and renamed over it,
/// so an interrupted save leaves any previous file in place.
pub fn save<T: StateValue>(path: &Path, value: &T) -> Result<()> {
	let text = to_state_string(value)?;
	let parent = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	fs::create_dir_all(parent)?;

	let mut temp_file = NamedTempFile::new_in(parent)?;
	{
		let mut writer = BufWriter::new(temp_file.as_file_mut());
		writer.write_all(text.as_bytes())?;
		writer.flush()?;
	}
	temp_file.as_file().sync_all()?;
	temp_file.persist(path).map_err(|e| ReconcileError::Io(e.error))?;

	info!("Saved {} state to {}", T::KIND, path.display());
	Ok(())
}

/// Read a state file written by [`save`]
pub fn load<T: StateValue>(path: &Path) -> Result<T> {
	let text = fs::read_to_string(path).map_err(|e| ReconcileError::file_unreadable(path, &e))?;
	let value = from_state_str(path, &text)?;
	debug!("Loaded {} state from {}", T::KIND, path.display());
	Ok(value)
}

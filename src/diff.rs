use crate::error::{ReconcileError, Result};
use crate::move_detection::classify::TextClassifier;
use crate::records::PickRecord;
use similar::TextDiff;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const ABSENT: &str = "/dev/null";

/// Unified diff between an old and a new file.
///
/// Either side may be absent (an addition or a deletion) and is then diffed as empty;
/// a path that no longer exists is treated the same way. Returns `None` when a present
/// side is not text. Line endings and trailing whitespace are normalized first, and
/// identical sides give an empty string.
pub fn render_diff(
	source: Option<&Path>, destination: Option<&Path>, classifier: &dyn TextClassifier,
	context_lines: usize,
) -> Result<Option<String>> {
	let Some(old) = read_side(source, classifier)? else {
		return Ok(None);
	};
	let Some(new) = read_side(destination, classifier)? else {
		return Ok(None);
	};

	let old_label = label(source);
	let new_label = label(destination);
	let diff = TextDiff::from_lines(&old, &new)
		.unified_diff()
		.context_radius(context_lines)
		.header(&old_label, &new_label)
		.to_string();
	Ok(Some(diff))
}

/// Diffs for a whole pick list, concatenated in pick order.
///
/// Picks whose files are not text are skipped, as are picks whose files cannot be
/// read (those are logged).
pub fn render_pick_diffs(
	picks: &[PickRecord], classifier: &dyn TextClassifier, context_lines: usize,
) -> Result<String> {
	let mut output = String::new();
	for pick in picks {
		let (old, new) = pick.sides();
		match render_diff(old, new, classifier, context_lines) {
			Ok(Some(diff)) => output.push_str(&diff),
			Ok(None) => debug!("Skipping non-text pick {}", pick.source.display()),
			Err(err) if err.is_file_scoped() => warn!(category = err.category(), "{}", err),
			Err(err) => return Err(err),
		}
	}
	Ok(output)
}

fn label(side: Option<&Path>) -> String {
	side.map_or_else(|| ABSENT.to_string(), |path| path.display().to_string())
}

fn read_side(side: Option<&Path>, classifier: &dyn TextClassifier) -> Result<Option<String>> {
	let Some(path) = side else {
		return Ok(Some(String::new()));
	};
	if !path.exists() {
		debug!("{} does not exist, diffing as empty", path.display());
		return Ok(Some(String::new()));
	}
	if !classifier.is_text_like(path) {
		return Ok(None);
	}
	let bytes = fs::read(path).map_err(|e| ReconcileError::file_unreadable(path, &e))?;
	Ok(Some(normalize_lines(&String::from_utf8_lossy(&bytes))))
}

/// Split on any newline convention, strip trailing whitespace, rejoin with `\n`
pub fn normalize_lines(text: &str) -> String {
	let unified = text.replace("\r\n", "\n").replace('\r', "\n");
	let mut out = String::with_capacity(unified.len());
	for line in unified.lines() {
		out.push_str(line.trim_end());
		out.push('\n');
	}
	out
}

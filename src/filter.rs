use crate::config::compile_pattern;
use crate::error::{ReconcileError, Result};
use crate::records::{PickKind, PickRecord};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Include/exclude regular expressions over the paths of a pick
#[derive(Debug, Clone, Default)]
pub struct PickFilter {
	include: Option<Regex>,
	exclude: Option<Regex>,
}

impl PickFilter {
	pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
		Ok(Self {
			include: include.map(compile_pattern).transpose()?,
			exclude: exclude.map(compile_pattern).transpose()?,
		})
	}

	pub fn is_empty(&self) -> bool {
		self.include.is_none() && self.exclude.is_none()
	}

	pub fn exclude(&self) -> Option<&Regex> {
		self.exclude.as_ref()
	}

	/// Kept when the include pattern (if any) matches one side and the exclude
	/// pattern (if any) matches neither. Exclude wins when both match.
	pub fn retains(&self, pick: &PickRecord) -> bool {
		let (old, new) = pick.sides();
		let matches = |re: &Regex| {
			[old, new].into_iter().flatten().any(|path| re.is_match(&path.to_string_lossy()))
		};
		let included = self.include.as_ref().map_or(true, matches);
		let excluded = self.exclude.as_ref().is_some_and(matches);
		included && !excluded
	}

	pub fn filter_picks(&self, picks: &[PickRecord]) -> Vec<PickRecord> {
		let kept: Vec<PickRecord> = picks.iter().filter(|pick| self.retains(pick)).cloned().collect();
		info!("Filter kept {} of {} picks", kept.len(), picks.len());
		kept
	}
}

/// Filter picks by optional include and exclude patterns
pub fn filter_picks(
	picks: &[PickRecord], include: Option<&str>, exclude: Option<&str>,
) -> Result<Vec<PickRecord>> {
	Ok(PickFilter::new(include, exclude)?.filter_picks(picks))
}

/// Mean of the pick scores; an error for an empty list
pub fn average_ratio(picks: &[PickRecord]) -> Result<f64> {
	if picks.is_empty() {
		return Err(ReconcileError::empty_aggregate("average ratio"));
	}
	let sum: f64 = picks.iter().map(|pick| pick.score.value()).sum();
	Ok(sum / picks.len() as f64)
}

/// Counts over a pick list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickStats {
	pub total: usize,
	pub matched: usize,
	pub unmatched: usize,
	pub resolved: usize,
	pub added: usize,
	/// Mean score over matched picks with a comparable score
	pub average: Option<f64>,
}

impl PickStats {
	pub fn from_picks(picks: &[PickRecord]) -> Self {
		let mut stats = PickStats { total: picks.len(), ..Default::default() };
		let mut scored = Vec::new();
		for pick in picks {
			match (pick.kind, &pick.destination) {
				(PickKind::Added, _) => stats.added += 1,
				(_, None) => stats.unmatched += 1,
				(kind, Some(_)) => {
					stats.matched += 1;
					if kind == PickKind::Resolved {
						stats.resolved += 1;
					}
					if pick.score.is_comparable() {
						scored.push(pick.clone());
					}
				}
			}
		}
		stats.average = average_ratio(&scored).ok();
		stats
	}
}

/// Append an added entry for every file under `new_root` that no pick lands on.
///
/// Paths matching `exclude` are left out, and a matching directory hides its
/// whole subtree. Added entries follow the existing picks in walk order.
pub fn reconcile_adds_and_deletes(
	picks: &[PickRecord], new_root: &Path, exclude: Option<&Regex>,
) -> Result<Vec<PickRecord>> {
	if !new_root.is_dir() {
		return Err(ReconcileError::invalid_path(new_root));
	}

	let claimed: HashSet<&Path> = picks
		.iter()
		.filter_map(|pick| match pick.kind {
			PickKind::Added => Some(pick.source.as_path()),
			_ => pick.destination.as_deref(),
		})
		.collect();

	let walker = WalkDir::new(new_root).sort_by_file_name().into_iter().filter_entry(|entry| {
		entry.depth() == 0
			|| !exclude.is_some_and(|re| re.is_match(&entry.path().to_string_lossy()))
	});

	let mut added: Vec<PathBuf> = Vec::new();
	for entry in walker {
		let entry = match entry {
			Ok(entry) => entry,
			Err(err) => {
				warn!(category = "file_unreadable", "Skipping entry under {}: {}", new_root.display(), err);
				continue;
			}
		};
		if entry.path().is_file() && !claimed.contains(entry.path()) {
			added.push(entry.into_path());
		}
	}

	info!("{} files under {} have no old counterpart", added.len(), new_root.display());
	let mut reconciled = picks.to_vec();
	reconciled.extend(added.into_iter().map(PickRecord::added));
	Ok(reconciled)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::records::{CandidateMatch, SimilarityScore};
	use std::fs;
	use tempfile::TempDir;

	fn pick(source: &str, destination: &str, score: f64) -> PickRecord {
		PickRecord::accepted(
			PathBuf::from(source),
			&CandidateMatch::new(PathBuf::from(destination), SimilarityScore::ratio(score)),
		)
	}

	#[test]
	fn test_exclude_wins_over_include() {
		let picks = vec![
			pick("old/src/a.rs", "new/src/a.rs", 1.0),
			pick("old/vendor/b.rs", "new/src/b.rs", 0.5),
			pick("old/docs/c.md", "new/docs/c.md", 0.5),
		];
		let kept = filter_picks(&picks, Some("src"), Some("vendor")).unwrap();
		assert_eq!(kept, vec![picks[0].clone()]);

		let kept = filter_picks(&picks, None, Some("vendor")).unwrap();
		assert_eq!(kept, vec![picks[0].clone(), picks[2].clone()]);
	}

	#[test]
	fn test_include_matches_either_side() {
		let picks = vec![pick("old/x.txt", "new/moved/x.txt", 1.0), PickRecord::none("old/y".into())];
		let kept = filter_picks(&picks, Some("moved"), None).unwrap();
		assert_eq!(kept.len(), 1);
		assert!(filter_picks(&picks, Some("("), None).is_err());
	}

	#[test]
	fn test_average_ratio() {
		let picks = vec![pick("a", "b", 1.0), pick("c", "d", 0.5)];
		assert_eq!(average_ratio(&picks).unwrap(), 0.75);
		assert!(matches!(average_ratio(&[]), Err(ReconcileError::EmptyAggregate { .. })));
	}

	#[test]
	fn test_pick_stats() {
		let picks = vec![
			pick("a", "b", 1.0),
			pick("c", "d", 0.5),
			PickRecord::none("e".into()),
			PickRecord::added("new/f".into()),
		];
		let stats = PickStats::from_picks(&picks);
		assert_eq!(stats.total, 4);
		assert_eq!(stats.matched, 2);
		assert_eq!(stats.unmatched, 1);
		assert_eq!(stats.added, 1);
		assert_eq!(stats.average, Some(0.75));
		assert_eq!(PickStats::from_picks(&[]).average, None);
	}

	#[test]
	fn test_reconcile_appends_unclaimed_files() {
		let new = TempDir::new().unwrap();
		fs::create_dir_all(new.path().join("kept")).unwrap();
		fs::create_dir_all(new.path().join("build")).unwrap();
		fs::write(new.path().join("kept/a.txt"), "a").unwrap();
		fs::write(new.path().join("kept/fresh.txt"), "fresh").unwrap();
		fs::write(new.path().join("build/out.o"), [0u8]).unwrap();

		let claimed = new.path().join("kept/a.txt");
		let picks = vec![pick("old/a.txt", &claimed.to_string_lossy(), 1.0)];
		let exclude = Regex::new("build").unwrap();

		let reconciled = reconcile_adds_and_deletes(&picks, new.path(), Some(&exclude)).unwrap();
		assert_eq!(reconciled.len(), 2);
		assert_eq!(reconciled[0], picks[0]);
		assert_eq!(reconciled[1], PickRecord::added(new.path().join("kept/fresh.txt")));
		assert_eq!(reconciled[1].score, SimilarityScore::NOT_COMPARABLE);

		let again = reconcile_adds_and_deletes(&reconciled, new.path(), Some(&exclude)).unwrap();
		assert_eq!(again, reconciled);
	}
}

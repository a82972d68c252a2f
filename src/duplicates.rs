//! Duplicate-target detection and resolution
//!
//! A duplicate target is a new-tree file that more than one pick claims as its
//! destination. Each group elects one winner by score, and picks that lost a
//! contest can then be retracted from a pick list.

use crate::error::{ReconcileError, Result};
use crate::records::{DuplicateGroup, DuplicateMember, PickKind, PickRecord};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Group picks by destination, keeping only destinations claimed at least twice.
///
/// Groups appear in the order their destination is first seen, and members in
/// pick order. Picks without a destination and added entries are ignored.
pub fn find_duplicate_targets(picks: &[PickRecord]) -> Vec<DuplicateGroup> {
	let mut positions: HashMap<&Path, usize> = HashMap::new();
	let mut groups: Vec<DuplicateGroup> = Vec::new();

	for pick in picks {
		if pick.kind == PickKind::Added {
			continue;
		}
		let Some(destination) = pick.destination.as_deref() else {
			continue;
		};
		let member = DuplicateMember { source: pick.source.clone(), score: pick.score };
		match positions.get(destination) {
			Some(&pos) => groups[pos].members.push(member),
			None => {
				positions.insert(destination, groups.len());
				groups.push(DuplicateGroup {
					destination: destination.to_path_buf(),
					members: vec![member],
				});
			}
		}
	}

	groups.retain(DuplicateGroup::is_material);
	info!("Found {} duplicate targets among {} picks", groups.len(), picks.len());
	groups
}

/// Outcome of electing a winner for one duplicate group
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
	pub pick: PickRecord,
	/// Another member had the same top score; the earlier one won
	pub tied: bool,
	pub losers: Vec<PathBuf>,
}

/// Elect the highest-scoring member of `group`, earliest member on ties
pub fn resolve_duplicates(group: &DuplicateGroup) -> Result<Resolution> {
	let Some((winner_pos, winner)) = group
		.members
		.iter()
		.enumerate()
		.reduce(|best, next| if next.1.score.value() > best.1.score.value() { next } else { best })
	else {
		return Err(ReconcileError::empty_aggregate("resolve duplicate group"));
	};

	let tied = group
		.members
		.iter()
		.enumerate()
		.any(|(pos, member)| pos != winner_pos && member.score == winner.score);
	if tied {
		warn!(
			"Ambiguous duplicate for {}: top score {} shared, electing {} by order",
			group.destination.display(),
			winner.score,
			winner.source.display()
		);
	}

	let losers = group
		.members
		.iter()
		.enumerate()
		.filter(|(pos, _)| *pos != winner_pos)
		.map(|(_, member)| member.source.clone())
		.collect();

	Ok(Resolution {
		pick: PickRecord::resolved(winner.source.clone(), group.destination.clone(), winner.score),
		tied,
		losers,
	})
}

/// Resolve every group, in group order
pub fn resolve_all(groups: &[DuplicateGroup]) -> Result<Vec<Resolution>> {
	groups.iter().map(resolve_duplicates).collect()
}

/// Picks split by whether they survived a duplicate contest
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retraction {
	pub kept: Vec<PickRecord>,
	pub retracted: Vec<PickRecord>,
}

/// Drop every pick whose destination was resolved in favour of a different source.
///
/// Running this again on `kept` with the same `resolved` list retracts nothing.
pub fn retract_superseded_picks(picks: &[PickRecord], resolved: &[PickRecord]) -> Retraction {
	let mut winners: HashMap<&Path, &Path> = HashMap::new();
	for pick in resolved {
		if let Some(destination) = pick.destination.as_deref() {
			winners.entry(destination).or_insert(pick.source.as_path());
		}
	}

	let mut retraction = Retraction::default();
	for pick in picks {
		let superseded = pick
			.destination
			.as_deref()
			.and_then(|destination| winners.get(destination))
			.is_some_and(|winner| *winner != pick.source.as_path());
		if superseded {
			warn!(
				"Retracting pick {} -> {} (score {})",
				pick.source.display(),
				pick.destination.as_deref().map(|d| d.display().to_string()).unwrap_or_default(),
				pick.score
			);
			retraction.retracted.push(pick.clone());
		} else {
			retraction.kept.push(pick.clone());
		}
	}

	info!("Retracted {} of {} picks", retraction.retracted.len(), picks.len());
	retraction
}

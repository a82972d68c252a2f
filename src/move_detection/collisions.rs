use crate::move_detection::candidates::CandidateGenerator;
use crate::move_detection::index::TreeIndex;
use crate::move_detection::similarity::{PreparedContent, Scored};
use crate::records::{ScoreMethod, SimilarityScore};
use std::path::PathBuf;
use tracing::{debug, info};

/// Two locations of the same basename inside one tree
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPair {
	pub first: PathBuf,
	pub second: PathBuf,
	pub score: SimilarityScore,
	pub method: ScoreMethod,
}

/// A basename found in more than one directory
#[derive(Debug, Clone, PartialEq)]
pub struct NameCollision {
	pub name: String,
	pub locations: Vec<PathBuf>,
	pub pairs: Vec<CollisionPair>,
}

/// Report every basename that occurs more than once in the indexed tree.
///
/// Each unordered pair of locations is scored once, in index order. Collisions
/// come back sorted by name.
pub fn find_name_collisions(
	index: &TreeIndex, generator: &CandidateGenerator,
) -> Vec<NameCollision> {
	let collisions: Vec<NameCollision> = index
		.shared_names()
		.into_iter()
		.map(|(name, dirs)| {
			let locations: Vec<PathBuf> = dirs.iter().map(|dir| dir.join(name)).collect();
			let contents: Vec<Option<PreparedContent>> =
				locations.iter().map(|path| generator.load_text(path)).collect();

			let mut pairs = Vec::with_capacity(locations.len() * (locations.len() - 1) / 2);
			for i in 0..locations.len() {
				for j in (i + 1)..locations.len() {
					let scored = match (&contents[i], &contents[j]) {
						(Some(a), Some(b)) => generator.scorer().score_prepared(a, b),
						_ => Scored::not_comparable(),
					};
					debug!(
						"{} <-> {}: {}",
						locations[i].display(),
						locations[j].display(),
						scored.score
					);
					pairs.push(CollisionPair {
						first: locations[i].clone(),
						second: locations[j].clone(),
						score: scored.score,
						method: scored.method,
					});
				}
			}

			NameCollision { name: name.to_string_lossy().into_owned(), locations, pairs }
		})
		.collect();

	info!("{} shared names under {}", collisions.len(), index.root().display());
	collisions
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::move_detection::classify::ContentSniffer;
	use crate::move_detection::similarity::SimilarityScorer;
	use std::fs;
	use std::sync::Arc;
	use tempfile::TempDir;

	fn generator() -> CandidateGenerator {
		CandidateGenerator::new(Arc::new(ContentSniffer::default()), SimilarityScorer::default())
	}

	#[test]
	fn test_unique_names_report_nothing() {
		let tree = TempDir::new().unwrap();
		fs::write(tree.path().join("a.txt"), "a").unwrap();
		fs::write(tree.path().join("b.txt"), "b").unwrap();

		let index = TreeIndex::build(tree.path()).unwrap();
		assert!(find_name_collisions(&index, &generator()).is_empty());
	}

	#[test]
	fn test_each_pair_scored_once() {
		let tree = TempDir::new().unwrap();
		for dir in ["x", "y", "z"] {
			fs::create_dir_all(tree.path().join(dir)).unwrap();
		}
		fs::write(tree.path().join("x/README"), "same text").unwrap();
		fs::write(tree.path().join("y/README"), "same text").unwrap();
		fs::write(tree.path().join("z/README"), [0u8, 0, 7]).unwrap();

		let index = TreeIndex::build(tree.path()).unwrap();
		let collisions = find_name_collisions(&index, &generator());
		assert_eq!(collisions.len(), 1);

		let collision = &collisions[0];
		assert_eq!(collision.name, "README");
		assert_eq!(collision.locations.len(), 3);
		assert_eq!(collision.pairs.len(), 3);

		let first = &collision.pairs[0];
		assert_eq!(first.first, tree.path().join("x/README"));
		assert_eq!(first.second, tree.path().join("y/README"));
		assert_eq!(first.score, SimilarityScore::IDENTICAL);
		assert_eq!(first.method, ScoreMethod::Identical);

		for pair in &collision.pairs[1..] {
			assert_eq!(pair.score, SimilarityScore::NOT_COMPARABLE);
			assert_eq!(pair.method, ScoreMethod::NotComparable);
		}
	}
}

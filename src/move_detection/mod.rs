//! Move detection between an old and a new file tree
//!
//! Files are matched by basename, then scored by content similarity so that a
//! reviewer can decide which same-named file in the new tree an old file became.
//!
//! # Module Organization
//!
//! - [`index`] - Basename index of a tree, cached per root
//! - [`classify`] - Text/binary classification of files
//! - [`similarity`] - Sequence-matching similarity ratio
//! - [`candidates`] - Candidate generation and ranking for one old file
//! - [`detector`] - Whole-tree pipeline over a worker pool
//! - [`collisions`] - Basenames repeated within a single tree

pub mod candidates;
pub mod classify;
pub mod collisions;
pub mod detector;
pub mod index;
pub mod similarity;

pub use candidates::CandidateGenerator;
pub use classify::{ContentSniffer, TextClassifier};
pub use collisions::{find_name_collisions, CollisionPair, NameCollision};
pub use detector::{DetectionStats, MoveDetector};
pub use index::{IndexCache, TreeIndex};
pub use similarity::{Scored, SimilarityScorer};

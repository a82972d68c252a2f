//! Content similarity scoring
//!
//! The ratio is `2 * M / T`, where `M` is the total size of the matching blocks
//! found by recursively taking the longest matching block and `T` is the combined
//! length of both sequences. Whitespace is junk: it never anchors a match, but a
//! match can be extended over it.

use crate::records::{ScoreMethod, SimilarityScore};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Sequences at least this long get the popular-element heuristic
const AUTOJUNK_MIN_LEN: usize = 200;

/// A matching block: `a[a_start..a_start + size] == b[b_start..b_start + size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
	pub a_start: usize,
	pub b_start: usize,
	pub size: usize,
}

/// Longest-matching-block sequence matcher over characters
pub struct SequenceMatcher<'a> {
	a: &'a [char],
	b: &'a [char],
	/// Positions in `b` of every non-junk, non-popular character
	b2j: HashMap<char, Vec<usize>>,
	bjunk: HashSet<char>,
}

impl<'a> SequenceMatcher<'a> {
	pub fn new(a: &'a [char], b: &'a [char], autojunk: bool) -> Self {
		let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
		for (j, &c) in b.iter().enumerate() {
			b2j.entry(c).or_default().push(j);
		}

		let bjunk: HashSet<char> = b2j.keys().copied().filter(|c| c.is_whitespace()).collect();
		for c in &bjunk {
			b2j.remove(c);
		}

		if autojunk && b.len() >= AUTOJUNK_MIN_LEN {
			let threshold = b.len() / 100 + 1;
			b2j.retain(|_, positions| positions.len() <= threshold);
		}

		Self { a, b, b2j, bjunk }
	}

	fn is_bjunk(&self, c: char) -> bool {
		self.bjunk.contains(&c)
	}

	/// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
	///
	/// Among equally long blocks the one starting earliest in `a`, then earliest
	/// in `b`, wins.
	pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
		let (a, b) = (self.a, self.b);
		let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

		// j2len[j] = length of the longest match ending at a[i - 1] and b[j]
		let mut j2len: HashMap<usize, usize> = HashMap::new();
		for i in alo..ahi {
			let mut next_j2len: HashMap<usize, usize> = HashMap::new();
			if let Some(positions) = self.b2j.get(&a[i]) {
				for &j in positions {
					if j < blo {
						continue;
					}
					if j >= bhi {
						break;
					}
					let prev = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 };
					let k = prev + 1;
					next_j2len.insert(j, k);
					if k > best_size {
						best_i = i + 1 - k;
						best_j = j + 1 - k;
						best_size = k;
					}
				}
			}
			j2len = next_j2len;
		}

		// Popular characters were left out of b2j; grow the block over them
		while best_i > alo
			&& best_j > blo
			&& !self.is_bjunk(b[best_j - 1])
			&& a[best_i - 1] == b[best_j - 1]
		{
			best_i -= 1;
			best_j -= 1;
			best_size += 1;
		}
		while best_i + best_size < ahi
			&& best_j + best_size < bhi
			&& !self.is_bjunk(b[best_j + best_size])
			&& a[best_i + best_size] == b[best_j + best_size]
		{
			best_size += 1;
		}

		// Then absorb adjacent junk that happens to match
		while best_i > alo
			&& best_j > blo
			&& self.is_bjunk(b[best_j - 1])
			&& a[best_i - 1] == b[best_j - 1]
		{
			best_i -= 1;
			best_j -= 1;
			best_size += 1;
		}
		while best_i + best_size < ahi
			&& best_j + best_size < bhi
			&& self.is_bjunk(b[best_j + best_size])
			&& a[best_i + best_size] == b[best_j + best_size]
		{
			best_size += 1;
		}

		Match { a_start: best_i, b_start: best_j, size: best_size }
	}

	/// All matching blocks in ascending order, adjacent blocks merged
	pub fn matching_blocks(&self) -> Vec<Match> {
		let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
		let mut blocks = Vec::new();

		while let Some((alo, ahi, blo, bhi)) = queue.pop() {
			let m = self.find_longest_match(alo, ahi, blo, bhi);
			if m.size == 0 {
				continue;
			}
			blocks.push(m);
			if alo < m.a_start && blo < m.b_start {
				queue.push((alo, m.a_start, blo, m.b_start));
			}
			if m.a_start + m.size < ahi && m.b_start + m.size < bhi {
				queue.push((m.a_start + m.size, ahi, m.b_start + m.size, bhi));
			}
		}
		blocks.sort();

		let mut merged: Vec<Match> = Vec::with_capacity(blocks.len());
		for m in blocks {
			match merged.last_mut() {
				Some(last)
					if last.a_start + last.size == m.a_start
						&& last.b_start + last.size == m.b_start =>
				{
					last.size += m.size;
				}
				_ => merged.push(m),
			}
		}
		merged
	}

	pub fn ratio(&self) -> f64 {
		let matches: usize = self.matching_blocks().iter().map(|m| m.size).sum();
		ratio_of(matches, self.a.len() + self.b.len())
	}

	/// Upper bound on [`SequenceMatcher::ratio`] from character counts alone
	pub fn quick_ratio(&self) -> f64 {
		let mut available: HashMap<char, isize> = HashMap::new();
		for &c in self.b {
			*available.entry(c).or_insert(0) += 1;
		}
		let mut matches = 0usize;
		for c in self.a {
			let count = available.entry(*c).or_insert(0);
			if *count > 0 {
				matches += 1;
			}
			*count -= 1;
		}
		ratio_of(matches, self.a.len() + self.b.len())
	}

	/// Upper bound on [`SequenceMatcher::quick_ratio`] from lengths alone
	pub fn real_quick_ratio(&self) -> f64 {
		let (la, lb) = (self.a.len(), self.b.len());
		ratio_of(la.min(lb), la + lb)
	}
}

fn ratio_of(matches: usize, total: usize) -> f64 {
	if total == 0 {
		1.0
	} else {
		2.0 * matches as f64 / total as f64
	}
}

/// A score together with the way it was produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
	pub score: SimilarityScore,
	pub method: ScoreMethod,
}

impl Scored {
	pub fn identical() -> Self {
		Self { score: SimilarityScore::IDENTICAL, method: ScoreMethod::Identical }
	}

	pub fn not_comparable() -> Self {
		Self { score: SimilarityScore::NOT_COMPARABLE, method: ScoreMethod::NotComparable }
	}
}

/// File content loaded once and digested, for scoring against many candidates
#[derive(Debug, Clone)]
pub struct PreparedContent {
	bytes: Vec<u8>,
	digest: Vec<u8>,
}

impl PreparedContent {
	pub fn new(bytes: Vec<u8>) -> Self {
		let digest = Sha256::digest(&bytes).to_vec();
		Self { bytes, digest }
	}

	pub fn from_file(path: &Path) -> std::io::Result<Self> {
		Ok(Self::new(std::fs::read(path)?))
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn digest(&self) -> &[u8] {
		&self.digest
	}

	/// Same length and same digest
	pub fn same_content(&self, other: &PreparedContent) -> bool {
		self.bytes.len() == other.bytes.len() && self.digest == other.digest
	}
}

/// Scores text contents against each other
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
	autojunk: bool,
}

impl Default for SimilarityScorer {
	fn default() -> Self {
		Self { autojunk: true }
	}
}

impl SimilarityScorer {
	pub fn new(autojunk: bool) -> Self {
		Self { autojunk }
	}

	/// Score two text contents; identical bytes short-circuit to 1.0
	pub fn score(&self, a: &[u8], b: &[u8]) -> Scored {
		if a == b {
			return Scored::identical();
		}
		self.ratio_scored(a, b)
	}

	/// Score two prepared contents, using their digests for the identical case
	pub fn score_prepared(&self, a: &PreparedContent, b: &PreparedContent) -> Scored {
		if a.same_content(b) {
			return Scored::identical();
		}
		self.ratio_scored(a.bytes(), b.bytes())
	}

	/// The sequence-matching ratio, always computed in full.
	///
	/// Inputs are put in a canonical order first, so the result does not depend on
	/// which side is passed first.
	pub fn sequence_ratio(&self, a: &[u8], b: &[u8]) -> f64 {
		let a: Vec<char> = String::from_utf8_lossy(a).chars().collect();
		let b: Vec<char> = String::from_utf8_lossy(b).chars().collect();
		let (first, second) = if (a.len(), &a) <= (b.len(), &b) { (&a, &b) } else { (&b, &a) };
		SequenceMatcher::new(first, second, self.autojunk).ratio()
	}

	fn ratio_scored(&self, a: &[u8], b: &[u8]) -> Scored {
		Scored {
			score: SimilarityScore::ratio(self.sequence_ratio(a, b)),
			method: ScoreMethod::SequenceRatio,
		}
	}
}

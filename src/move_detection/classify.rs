use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

/// Decides whether a file holds text that can be scored for similarity
pub trait TextClassifier: Send + Sync {
	fn is_text_like(&self, path: &Path) -> bool;
}

/// Classifies files by inspecting a prefix of their content
///
/// Empty files are text. A NUL byte, or bytes that are not UTF-8, mark a file as
/// binary. A multi-byte sequence cut short by the end of the prefix still counts
/// as text.
#[derive(Debug, Clone)]
pub struct ContentSniffer {
	sniff_bytes: usize,
}

impl ContentSniffer {
	pub fn new(sniff_bytes: usize) -> Self {
		Self { sniff_bytes: sniff_bytes.max(1) }
	}

	/// Classify an in-memory prefix
	pub fn is_text_prefix(prefix: &[u8]) -> bool {
		if prefix.contains(&0) {
			return false;
		}
		match std::str::from_utf8(prefix) {
			Ok(_) => true,
			// `error_len() == None` means the input ended mid-character
			Err(err) => err.error_len().is_none(),
		}
	}

	fn read_prefix(&self, path: &Path) -> std::io::Result<Vec<u8>> {
		let file = File::open(path)?;
		let mut buffer = Vec::with_capacity(self.sniff_bytes.min(64 * 1024));
		file.take(self.sniff_bytes as u64).read_to_end(&mut buffer)?;
		Ok(buffer)
	}
}

impl Default for ContentSniffer {
	fn default() -> Self {
		Self::new(8192)
	}
}

impl TextClassifier for ContentSniffer {
	fn is_text_like(&self, path: &Path) -> bool {
		match self.read_prefix(path) {
			Ok(prefix) => Self::is_text_prefix(&prefix),
			Err(err) => {
				warn!("Cannot classify {}: {}", path.display(), err);
				false
			}
		}
	}
}

//! Stable chunk identifiers

use sha2::{Digest, Sha256};

/// First 16 hex chars of SHA-256 over `path:start-end:content`, with the
/// content cut to its first 1000 characters.
///
/// Re-indexing an unchanged file yields the same ids.
pub fn stable_hash(content: &str, path: &str, start_line: usize, end_line: usize) -> String {
    let content_prefix: String = content.chars().take(1000).collect();
    let digest = Sha256::digest(format!("{path}:{start_line}-{end_line}:{content_prefix}"));
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

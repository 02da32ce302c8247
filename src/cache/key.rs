//! Cache Key Module
//!
//! Derives stable, fixed-length keys from free-text queries.
//!
//! Trivially different spellings of the same query ("Technology",
//! " technology ") are meant to collide: the query is normalized before
//! hashing so repeated lookups land on the same entry.

use sha2::{Digest, Sha256};
use std::fmt;

// == Key Length ==
/// Number of hex characters kept from the SHA-256 digest.
pub const KEY_LENGTH: usize = 16;

// == Cache Key ==
/// A fixed-length identifier derived from a normalized query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for a query.
    ///
    /// Normalizes the query (trim, lowercase, collapse internal whitespace),
    /// hashes it with SHA-256, and keeps the first [`KEY_LENGTH`] hex
    /// characters. Always succeeds; two queries that normalize identically
    /// always produce the same key.
    pub fn derive(query: &str) -> Self {
        let normalized = normalize(query);

        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        Self(digest[..KEY_LENGTH].to_string())
    }

    /// Rebuilds a key from its persisted hex form (index records, blob
    /// file names). No validation beyond ownership; only trusted internal
    /// sources call this.
    pub(crate) fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Normalization ==
/// Normalizes a query: lowercase, trimmed, internal whitespace collapsed
/// to single spaces. Pure and side-effect-free.
fn normalize(query: &str) -> String {
    query
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

//! Cache Entry Metadata Module
//!
//! Defines the per-key metadata record tracked by the index.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;

// == Entry Metadata ==
/// Metadata for a single cached report.
///
/// Created on a successful store, mutated on every successful read
/// (`hit_count`, `last_accessed`), removed on expiry or deletion. The
/// payload itself lives in a compressed blob file keyed by `key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Key the blob file is named after
    pub key: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp (created_at + TTL)
    pub expires_at: DateTime<Utc>,
    /// Size of the uncompressed payload in bytes
    pub size_bytes: u64,
    /// Size of the stored compressed blob in bytes
    pub compressed_size_bytes: u64,
    /// Number of successful reads served from this entry
    pub hit_count: u64,
    /// Timestamp of the most recent successful read
    pub last_accessed: DateTime<Utc>,
}

impl EntryMetadata {
    // == Constructor ==
    /// Creates metadata for a freshly stored payload.
    ///
    /// # Arguments
    /// * `key` - The derived cache key
    /// * `size_bytes` - Uncompressed payload size
    /// * `compressed_size_bytes` - Stored blob size
    /// * `ttl` - Time-to-live; `expires_at = now + ttl`
    pub fn new(
        key: &CacheKey,
        size_bytes: u64,
        compressed_size_bytes: u64,
        ttl: std::time::Duration,
    ) -> Self {
        let now = Utc::now();
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(7));

        Self {
            key: key.as_str().to_string(),
            created_at: now,
            expires_at: now + ttl,
            size_bytes,
            compressed_size_bytes,
            hit_count: 0,
            last_accessed: now,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// Boundary condition: an entry whose `expires_at` equals the current
    /// time is already expired. Once the TTL has fully elapsed the entry is
    /// treated as gone.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    // == Touch ==
    /// Records a successful read: bumps the hit counter and refreshes the
    /// last-access timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.hit_count += 1;
        self.last_accessed = now;
    }

    // == Age ==
    /// Seconds elapsed since the entry was created.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

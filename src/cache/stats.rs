//! Cache Statistics Module
//!
//! Aggregates usage and compression metrics over the live index.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::EntryMetadata;

// == Cache Stats ==
/// Usage metrics aggregated over all live entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of live entries
    pub total_entries: usize,
    /// Sum of uncompressed payload sizes in bytes
    pub total_size_bytes: u64,
    /// Sum of stored compressed blob sizes in bytes
    pub total_compressed_bytes: u64,
    /// Sum of hit counts across live entries
    pub total_hits: u64,
    /// Hit rate, computed as hits / (hits + entry count)
    pub hit_rate: f64,
    /// Creation time of the oldest live entry, None when empty
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Creation time of the newest live entry, None when empty
    pub newest_entry: Option<DateTime<Utc>>,
}

impl CacheStats {
    /// Aggregates stats from an iterator of live metadata records.
    pub fn from_entries<'a>(entries: impl Iterator<Item = &'a EntryMetadata>) -> Self {
        let mut stats = Self::default();

        for meta in entries {
            stats.total_entries += 1;
            stats.total_size_bytes += meta.size_bytes;
            stats.total_compressed_bytes += meta.compressed_size_bytes;
            stats.total_hits += meta.hit_count;

            stats.oldest_entry = Some(match stats.oldest_entry {
                Some(oldest) if oldest <= meta.created_at => oldest,
                _ => meta.created_at,
            });
            stats.newest_entry = Some(match stats.newest_entry {
                Some(newest) if newest >= meta.created_at => newest,
                _ => meta.created_at,
            });
        }

        let denominator = stats.total_hits + stats.total_entries as u64;
        stats.hit_rate = if denominator > 0 {
            stats.total_hits as f64 / denominator as f64
        } else {
            0.0
        };

        stats
    }
}

// == Compression Stats ==
/// Compression effectiveness over all live entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompressionStats {
    /// Sum of uncompressed payload sizes in bytes
    pub total_size_bytes: u64,
    /// Sum of stored compressed blob sizes in bytes
    pub total_compressed_bytes: u64,
    /// Space saved: 1 - (compressed / uncompressed), 0 when empty
    pub compression_ratio: f64,
}

impl CompressionStats {
    /// Aggregates compression stats from an iterator of live metadata records.
    pub fn from_entries<'a>(entries: impl Iterator<Item = &'a EntryMetadata>) -> Self {
        let mut stats = Self::default();

        for meta in entries {
            stats.total_size_bytes += meta.size_bytes;
            stats.total_compressed_bytes += meta.compressed_size_bytes;
        }

        stats.compression_ratio = if stats.total_size_bytes > 0 {
            1.0 - (stats.total_compressed_bytes as f64 / stats.total_size_bytes as f64)
        } else {
            0.0
        };

        stats
    }
}

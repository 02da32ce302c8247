//! Cache Engine Module
//!
//! The facade combining key derivation, the blob store, and the index
//! into the query-level cache API.
//!
//! Read-path failures (missing blob, corrupt blob, undeserializable
//! payload) always degrade to a miss so callers can fall back to
//! recomputation; only write-path failures surface as errors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{
    BlobStore, CacheIndex, CacheKey, CacheStats, CompressionStats, EntryMetadata, KeyLocks,
};
use crate::config::Config;
use crate::error::{BlobReadError, Result};

// == Engine Configuration ==
/// Runtime configuration for a cache instance.
///
/// Holds real durations so tests can use sub-second TTLs; the server's
/// [`Config`] converts its day/hour granularity through `From`.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Storage root for blobs and the index document
    pub directory: PathBuf,
    /// Time-to-live applied to every stored entry
    pub ttl: Duration,
    /// Advisory cap on total compressed bytes, in megabytes
    pub max_size_mb: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".report-cache"),
            ttl: Duration::from_secs(7 * 24 * 3600),
            max_size_mb: 500,
        }
    }
}

impl From<&Config> for CacheConfig {
    fn from(config: &Config) -> Self {
        Self {
            directory: config.directory.clone(),
            ttl: config.ttl(),
            max_size_mb: config.max_size_mb,
        }
    }
}

// == Lookup Result ==
/// Outcome of a cache read.
///
/// A miss carries no metadata fields; a hit reports the entry's age, its
/// post-increment hit count, and the uncompressed payload size.
#[derive(Debug)]
pub struct Lookup<T> {
    /// The cached payload, None on a miss
    pub data: Option<T>,
    /// Whether the read was served from the cache
    pub from_cache: bool,
    /// Seconds since the entry was created
    pub age_seconds: Option<i64>,
    /// Reads served from this entry, including this one
    pub hit_count: Option<u64>,
    /// Uncompressed payload size in bytes
    pub size_bytes: Option<u64>,
}

impl<T> Lookup<T> {
    fn miss() -> Self {
        Self {
            data: None,
            from_cache: false,
            age_seconds: None,
            hit_count: None,
            size_bytes: None,
        }
    }
}

// == Reports ==
/// Result of an expiration/orphan sweep.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CleanupReport {
    /// Entries and orphan blobs removed
    pub deleted_count: usize,
    /// Compressed bytes reclaimed
    pub freed_bytes: u64,
}

/// Result of a warmup probe: which queries would miss.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WarmupReport {
    /// Number of queries probed
    pub checked: usize,
    /// Queries with no live entry, in input order
    pub missing: Vec<String>,
}

// == Report Cache ==
/// Compressed, TTL-based persistent cache keyed by free-text query.
///
/// One instance owns its cache directory exclusively; construct with
/// [`ReportCache::open`] and share behind an `Arc`. There is no global
/// instance: tests run isolated engines against temporary directories.
#[derive(Debug)]
pub struct ReportCache {
    store: BlobStore,
    index: RwLock<CacheIndex>,
    locks: KeyLocks,
    config: CacheConfig,
}

impl ReportCache {
    // == Constructor ==
    /// Opens the cache: creates the directory if needed, loads the
    /// persisted index, and reconciles it against the blobs on disk.
    pub async fn open(config: CacheConfig) -> Result<Self> {
        let store = BlobStore::open(&config.directory).await?;
        let index = CacheIndex::load(&config.directory, &store).await;

        info!(
            directory = %config.directory.display(),
            entries = index.len(),
            "cache opened"
        );

        Ok(Self {
            store,
            index: RwLock::new(index),
            locks: KeyLocks::new(),
            config,
        })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The cache directory root.
    pub fn directory(&self) -> &Path {
        self.store.directory()
    }

    // == Set ==
    /// Stores a payload under the key derived from `query`.
    ///
    /// Serializes to canonical JSON bytes, compresses, persists the blob,
    /// then records metadata with `expires_at = now + ttl`. If compression
    /// or the filesystem write fails, the index is left untouched and the
    /// error is surfaced so the caller can decide to proceed uncached.
    pub async fn set<T: Serialize>(&self, query: &str, data: &T) -> Result<()> {
        let key = CacheKey::derive(query);
        let _guard = self.locks.acquire(&key).await;

        let payload = serde_json::to_vec(data)?;
        let size_bytes = payload.len() as u64;
        let compressed_size_bytes = self.store.put(&key, &payload).await?;

        let meta = EntryMetadata::new(&key, size_bytes, compressed_size_bytes, self.config.ttl);

        let total_compressed = {
            let mut index = self.index.write().await;
            index.record(meta).await?;
            index.entries().map(|m| m.compressed_size_bytes).sum::<u64>()
        };

        debug!(key = %key, size_bytes, compressed_size_bytes, "entry stored");

        // Advisory budget only; nothing is evicted.
        let budget = self.config.max_size_mb * 1024 * 1024;
        if total_compressed > budget {
            warn!(
                total_compressed,
                budget, "cache exceeds advisory size budget"
            );
        }

        drop(_guard);
        self.locks.prune(&key).await;
        Ok(())
    }

    // == Get ==
    /// Reads the payload cached for `query`.
    ///
    /// Absent or expired entries report a miss; expired entries are pruned
    /// on the way. A missing, corrupt, or undeserializable blob is also a
    /// miss (the broken entry is pruned), never an error. A hit touches
    /// the entry's statistics.
    pub async fn get<T: DeserializeOwned>(&self, query: &str) -> Lookup<T> {
        let key = CacheKey::derive(query);
        let guard = self.locks.acquire(&key).await;
        let now = Utc::now();

        let meta = { self.index.read().await.lookup(&key).cloned() };
        let Some(meta) = meta else {
            drop(guard);
            self.locks.prune(&key).await;
            return Lookup::miss();
        };

        if meta.is_expired(now) {
            debug!(key = %key, "entry expired on read");
            self.prune_entry(&key).await;
            drop(guard);
            self.locks.prune(&key).await;
            return Lookup::miss();
        }

        let outcome = match self.store.get(&key).await {
            Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
                Ok(data) => {
                    let touched = self.index.write().await.touch(&key, now).await;
                    let touched = touched.unwrap_or(meta);
                    Lookup {
                        data: Some(data),
                        from_cache: true,
                        age_seconds: Some(touched.age_seconds(now)),
                        hit_count: Some(touched.hit_count),
                        size_bytes: Some(touched.size_bytes),
                    }
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "cached payload undeserializable, pruning");
                    self.prune_entry(&key).await;
                    Lookup::miss()
                }
            },
            Err(BlobReadError::NotFound) => {
                debug!(key = %key, "index record without blob, pruning");
                let _ = self.index.write().await.remove(&key).await;
                Lookup::miss()
            }
            Err(BlobReadError::Corrupt(reason)) => {
                warn!(key = %key, reason = %reason, "corrupt blob, pruning");
                self.prune_entry(&key).await;
                Lookup::miss()
            }
        };

        drop(guard);
        self.locks.prune(&key).await;
        outcome
    }

    // == Has ==
    /// Whether a live, unexpired entry exists for `query`. No side effects.
    pub async fn has(&self, query: &str) -> bool {
        let key = CacheKey::derive(query);
        let now = Utc::now();

        self.index
            .read()
            .await
            .lookup(&key)
            .map(|meta| !meta.is_expired(now))
            .unwrap_or(false)
    }

    // == Delete ==
    /// Removes the entry for `query`.
    ///
    /// Idempotent: returns true if an index record or blob was removed,
    /// false when nothing existed.
    pub async fn delete(&self, query: &str) -> bool {
        let key = CacheKey::derive(query);
        let _guard = self.locks.acquire(&key).await;

        let removed_record = self.index.write().await.remove(&key).await.is_some();
        let removed_blob = match self.store.delete(&key).await {
            Ok(freed) => freed.is_some(),
            Err(err) => {
                warn!(key = %key, error = %err, "failed to delete blob");
                false
            }
        };

        drop(_guard);
        self.locks.prune(&key).await;
        removed_record || removed_blob
    }

    // == Clear ==
    /// Removes every entry and every blob file.
    ///
    /// Partial completion is expected, not exceptional: per-file failures
    /// are logged and skipped. Returns the number of index records
    /// dropped; the (possibly now-empty) index document remains on disk.
    pub async fn clear(&self) -> usize {
        let removed = {
            let mut index = self.index.write().await;
            let removed = index.clear().await;
            self.store.clear().await;
            removed
        };
        self.locks.clear().await;

        info!(removed, "cache cleared");
        removed
    }

    // == Cleanup ==
    /// Sweeps expired entries and orphan blobs.
    ///
    /// Every expired index record is removed along with its blob; blob
    /// files with no live record (left behind by an unclean shutdown) are
    /// reclaimed too. Reports the total removed and compressed bytes
    /// freed.
    pub async fn cleanup(&self) -> CleanupReport {
        let now = Utc::now();
        let mut report = CleanupReport::default();

        let expired: Vec<String> = {
            let index = self.index.read().await;
            index
                .entries()
                .filter(|meta| meta.is_expired(now))
                .map(|meta| meta.key.clone())
                .collect()
        };

        for key_hex in expired {
            let key = CacheKey::from_hex(key_hex);
            let guard = self.locks.acquire(&key).await;

            if let Some(meta) = self.index.write().await.remove(&key).await {
                report.deleted_count += 1;
                report.freed_bytes += meta.compressed_size_bytes;
            }
            if let Err(err) = self.store.delete(&key).await {
                warn!(key = %key, error = %err, "failed to delete expired blob");
            }

            drop(guard);
            self.locks.prune(&key).await;
        }

        // Orphan sweep: blobs with no live index record are unreachable
        // garbage from a previous unclean shutdown.
        match self.store.list_keys().await {
            Ok(on_disk) => {
                for key_hex in on_disk {
                    let key = CacheKey::from_hex(key_hex);
                    if self.index.read().await.contains(&key) {
                        continue;
                    }

                    let guard = self.locks.acquire(&key).await;
                    if !self.index.read().await.contains(&key) {
                        match self.store.delete(&key).await {
                            Ok(Some(freed)) => {
                                debug!(key = %key, freed, "orphan blob reclaimed");
                                report.deleted_count += 1;
                                report.freed_bytes += freed;
                            }
                            Ok(None) => {}
                            Err(err) => {
                                warn!(key = %key, error = %err, "failed to delete orphan blob")
                            }
                        }
                    }
                    drop(guard);
                    self.locks.prune(&key).await;
                }
            }
            Err(err) => warn!(error = %err, "failed to scan for orphan blobs"),
        }

        if report.deleted_count > 0 {
            info!(
                deleted = report.deleted_count,
                freed_bytes = report.freed_bytes,
                "cleanup sweep finished"
            );
        }

        report
    }

    // == Warmup ==
    /// No-op probe reporting which queries have no live entry, so an
    /// external orchestrator can pre-fetch them.
    pub async fn warmup(&self, queries: &[String]) -> WarmupReport {
        let now = Utc::now();
        let index = self.index.read().await;

        let missing = queries
            .iter()
            .filter(|query| {
                let key = CacheKey::derive(query);
                index
                    .lookup(&key)
                    .map(|meta| meta.is_expired(now))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        WarmupReport {
            checked: queries.len(),
            missing,
        }
    }

    // == Stats ==
    /// Usage statistics aggregated over the live index.
    pub async fn stats(&self) -> CacheStats {
        CacheStats::from_entries(self.index.read().await.entries())
    }

    /// Compression effectiveness aggregated over the live index.
    pub async fn compression_stats(&self) -> CompressionStats {
        CompressionStats::from_entries(self.index.read().await.entries())
    }

    /// Rough in-memory footprint of the index, in bytes.
    pub async fn memory_footprint_bytes(&self) -> u64 {
        let index = self.index.read().await;
        index
            .entries()
            .map(|meta| (std::mem::size_of::<EntryMetadata>() + 2 * meta.key.len()) as u64)
            .sum()
    }

    // == Prune Entry ==
    /// Removes both the index record and the blob for a key. Used on the
    /// read path for expired or broken entries.
    async fn prune_entry(&self, key: &CacheKey) {
        let _ = self.index.write().await.remove(key).await;
        if let Err(err) = self.store.delete(key).await {
            warn!(key = %key, error = %err, "failed to delete blob while pruning");
        }
    }
}

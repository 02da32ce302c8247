//! Cache Index Module
//!
//! In-memory mapping from cache key to entry metadata, mirrored to a
//! single JSON document on disk so it survives restarts.
//!
//! The index is the source of truth for "is this entry live". Its core
//! invariant: every key it holds has a readable blob in the store while
//! the entry is live. The reverse need not hold; stray blobs without
//! records are tolerated and never read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::{BlobStore, CacheKey, EntryMetadata};
use crate::error::Result;

// == Index File Name ==
/// Name of the persisted index document inside the cache directory.
pub const INDEX_FILE: &str = "index.json";

// == Cache Index ==
/// Metadata records for all live entries, owned exclusively by the engine.
#[derive(Debug)]
pub struct CacheIndex {
    entries: HashMap<String, EntryMetadata>,
    path: PathBuf,
}

impl CacheIndex {
    // == Constructor ==
    /// Creates an empty index persisting to `directory/index.json`.
    pub fn empty(directory: &Path) -> Self {
        Self {
            entries: HashMap::new(),
            path: directory.join(INDEX_FILE),
        }
    }

    // == Load ==
    /// Loads the persisted index and reconciles it against disk state.
    ///
    /// A missing or unparsable index document is recovered by starting
    /// empty (logged, never fatal). Each persisted record is kept only if
    /// its blob file still exists and it has not expired; everything else
    /// is discarded, so the in-memory index never claims liveness for an
    /// absent blob. Blobs without records are left alone here; the cleanup
    /// sweep reclaims them.
    pub async fn load(directory: &Path, store: &BlobStore) -> Self {
        let mut index = Self::empty(directory);

        let records: Vec<EntryMetadata> = match tokio::fs::read(&index.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(records) => records,
                Err(err) => {
                    warn!(error = %err, "index document unparsable, starting empty");
                    return index;
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no index document found, starting empty");
                return index;
            }
            Err(err) => {
                warn!(error = %err, "failed to read index document, starting empty");
                return index;
            }
        };

        let total = records.len();
        let now = Utc::now();

        for record in records {
            if record.is_expired(now) {
                continue;
            }
            let key = CacheKey::from_hex(record.key.clone());
            if !store.contains(&key).await {
                continue;
            }
            index.entries.insert(record.key.clone(), record);
        }

        let dropped = total - index.entries.len();
        if dropped > 0 {
            info!(
                kept = index.entries.len(),
                dropped, "index reconciled against disk state"
            );
        }

        index
    }

    // == Record ==
    /// Inserts or replaces the metadata for a key and persists the full
    /// index before returning.
    ///
    /// Persisting here means a crash between the blob write and this call
    /// can only ever lose a cache-hit opportunity (orphan blob), never
    /// corrupt a read.
    pub async fn record(&mut self, meta: EntryMetadata) -> Result<()> {
        self.entries.insert(meta.key.clone(), meta);
        self.persist().await
    }

    // == Lookup ==
    /// Pure in-memory read of a key's metadata.
    pub fn lookup(&self, key: &CacheKey) -> Option<&EntryMetadata> {
        self.entries.get(key.as_str())
    }

    // == Touch ==
    /// Bumps the hit count and last-access time for a key.
    ///
    /// Persistence is best-effort: losing a few hit-count increments
    /// across a crash is acceptable, so a failed write is logged rather
    /// than surfaced. Returns the updated metadata.
    pub async fn touch(&mut self, key: &CacheKey, now: DateTime<Utc>) -> Option<EntryMetadata> {
        let updated = {
            let meta = self.entries.get_mut(key.as_str())?;
            meta.touch(now);
            meta.clone()
        };

        if let Err(err) = self.persist().await {
            warn!(key = %key, error = %err, "failed to persist hit statistics");
        }

        Some(updated)
    }

    // == Remove ==
    /// Deletes the in-memory record and persists the index.
    ///
    /// Returns the removed metadata, or `None` if the key was absent.
    pub async fn remove(&mut self, key: &CacheKey) -> Option<EntryMetadata> {
        let removed = self.entries.remove(key.as_str())?;

        if let Err(err) = self.persist().await {
            warn!(key = %key, error = %err, "failed to persist index after removal");
        }

        Some(removed)
    }

    // == Clear ==
    /// Drops every record and persists the now-empty index document.
    pub async fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();

        if let Err(err) = self.persist().await {
            warn!(error = %err, "failed to persist index after clear");
        }

        removed
    }

    // == Accessors ==
    /// Iterates all live metadata records.
    pub fn entries(&self) -> impl Iterator<Item = &EntryMetadata> {
        self.entries.values()
    }

    /// Whether a record exists for the key.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key.as_str())
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no records are held.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Persist ==
    /// Writes the full index document to disk.
    async fn persist(&self) -> Result<()> {
        let records: Vec<&EntryMetadata> = self.entries.values().collect();
        let json = serde_json::to_vec_pretty(&records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn meta_for(query: &str, ttl: Duration) -> (CacheKey, EntryMetadata) {
        let key = CacheKey::derive(query);
        let meta = EntryMetadata::new(&key, 100, 40, ttl);
        (key, meta)
    }

    #[tokio::test]
    async fn test_record_and_lookup() {
        let dir = tempdir().unwrap();
        let mut index = CacheIndex::empty(dir.path());
        let (key, meta) = meta_for("query", Duration::from_secs(60));

        index.record(meta).await.unwrap();

        let found = index.lookup(&key).unwrap();
        assert_eq!(found.key, key.as_str());
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_record_persists_document() {
        let dir = tempdir().unwrap();
        let mut index = CacheIndex::empty(dir.path());
        let (_, meta) = meta_for("persisted", Duration::from_secs(60));

        index.record(meta).await.unwrap();

        let bytes = tokio::fs::read(dir.path().join(INDEX_FILE)).await.unwrap();
        let records: Vec<EntryMetadata> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_touch_updates_statistics() {
        let dir = tempdir().unwrap();
        let mut index = CacheIndex::empty(dir.path());
        let (key, meta) = meta_for("touched", Duration::from_secs(60));
        index.record(meta).await.unwrap();

        let updated = index.touch(&key, Utc::now()).await.unwrap();
        assert_eq!(updated.hit_count, 1);

        let updated = index.touch(&key, Utc::now()).await.unwrap();
        assert_eq!(updated.hit_count, 2);
    }

    #[tokio::test]
    async fn test_touch_unknown_key() {
        let dir = tempdir().unwrap();
        let mut index = CacheIndex::empty(dir.path());

        let result = index.touch(&CacheKey::derive("missing"), Utc::now()).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempdir().unwrap();
        let mut index = CacheIndex::empty(dir.path());
        let (key, meta) = meta_for("removed", Duration::from_secs(60));
        index.record(meta).await.unwrap();

        assert!(index.remove(&key).await.is_some());
        assert!(index.remove(&key).await.is_none());
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_load_reconciles_missing_blobs() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();

        // Two records persisted, but only one has a blob on disk.
        let (with_blob, meta_a) = meta_for("has blob", Duration::from_secs(60));
        let (_, meta_b) = meta_for("blob lost", Duration::from_secs(60));
        store.put(&with_blob, b"payload").await.unwrap();

        let mut index = CacheIndex::empty(dir.path());
        index.record(meta_a).await.unwrap();
        index.record(meta_b).await.unwrap();
        drop(index);

        let reloaded = CacheIndex::load(dir.path(), &store).await;
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains(&with_blob));
    }

    #[tokio::test]
    async fn test_load_drops_expired_records() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();

        let (key, meta) = meta_for("expires instantly", Duration::from_secs(0));
        store.put(&key, b"payload").await.unwrap();

        let mut index = CacheIndex::empty(dir.path());
        index.record(meta).await.unwrap();
        drop(index);

        let reloaded = CacheIndex::load(dir.path(), &store).await;
        assert_eq!(reloaded.len(), 0);
    }

    #[tokio::test]
    async fn test_load_missing_document_starts_empty() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();

        let index = CacheIndex::load(dir.path(), &store).await;
        assert_eq!(index.len(), 0);
    }

    #[tokio::test]
    async fn test_load_corrupt_document_starts_empty() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();
        tokio::fs::write(dir.path().join(INDEX_FILE), b"{ not json")
            .await
            .unwrap();

        let index = CacheIndex::load(dir.path(), &store).await;
        assert_eq!(index.len(), 0);
    }

    #[tokio::test]
    async fn test_load_tolerates_stray_blobs() {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();

        // Blob with no index record: ignored at load, not an error.
        store
            .put(&CacheKey::derive("orphan"), b"leftover")
            .await
            .unwrap();

        let index = CacheIndex::load(dir.path(), &store).await;
        assert_eq!(index.len(), 0);
    }
}

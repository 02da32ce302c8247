//! Blob Store Module
//!
//! On-disk repository of compressed payload blobs, one file per key.
//!
//! The store is the source of truth for "does the payload still exist";
//! liveness is the index's concern. Stray blob files without index records
//! are tolerated here and reclaimed by the cleanup sweep.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use crate::cache::CacheKey;
use crate::error::{BlobReadError, CacheError, Result};

// == Blob File Extension ==
/// Suffix for blob files inside the cache directory.
pub const BLOB_EXTENSION: &str = ".bin.gz";

// == Blob Store ==
/// Compressed blob repository rooted at a dedicated cache directory.
///
/// The directory is owned exclusively by one store instance; no file
/// locking is implemented, so running multiple instances against the same
/// directory is unsupported.
#[derive(Debug)]
pub struct BlobStore {
    directory: PathBuf,
}

impl BlobStore {
    // == Constructor ==
    /// Opens a store rooted at `directory`, creating it if needed.
    pub async fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&directory).await?;
        Ok(Self { directory })
    }

    /// Returns the cache directory root.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the blob file for a key.
    pub fn blob_path(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(format!("{}{}", key.as_str(), BLOB_EXTENSION))
    }

    // == Put ==
    /// Compresses `payload` and writes it to the key's blob file,
    /// overwriting any existing blob.
    ///
    /// Returns the compressed size in bytes. On compression or filesystem
    /// failure the operation aborts with `CacheError::Storage` and the
    /// caller must not record an index entry.
    pub async fn put(&self, key: &CacheKey, payload: &[u8]) -> Result<u64> {
        let compressed = compress(payload)?;
        let compressed_len = compressed.len() as u64;

        tokio::fs::write(self.blob_path(key), compressed).await?;

        debug!(key = %key, compressed_bytes = compressed_len, "blob written");
        Ok(compressed_len)
    }

    // == Get ==
    /// Reads and decompresses the blob for a key.
    ///
    /// A missing file signals `NotFound`; an unreadable or truncated file
    /// signals `Corrupt`. Callers treat both as a cache miss.
    pub async fn get(&self, key: &CacheKey) -> std::result::Result<Vec<u8>, BlobReadError> {
        let path = self.blob_path(key);

        let compressed = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobReadError::NotFound);
            }
            Err(err) => return Err(BlobReadError::Corrupt(err.to_string())),
        };

        decompress(&compressed).map_err(|err| BlobReadError::Corrupt(err.to_string()))
    }

    // == Delete ==
    /// Removes the blob for a key if present.
    ///
    /// Absence is not an error. Returns the size of the removed file in
    /// bytes, or `None` if no blob existed.
    pub async fn delete(&self, key: &CacheKey) -> Result<Option<u64>> {
        let path = self.blob_path(key);

        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::from(err)),
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(Some(size)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CacheError::from(err)),
        }
    }

    // == Contains ==
    /// Checks whether a blob file exists for the key.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        tokio::fs::try_exists(self.blob_path(key))
            .await
            .unwrap_or(false)
    }

    // == List Keys ==
    /// Enumerates the keys of every blob file currently on disk,
    /// including orphans with no index record.
    pub async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.directory).await?;

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(key) = name.strip_suffix(BLOB_EXTENSION) {
                    keys.push(key.to_string());
                }
            }
        }

        Ok(keys)
    }

    // == Clear ==
    /// Removes every blob file in the cache directory.
    ///
    /// An already-empty directory is success. Individual removal failures
    /// are logged and skipped; returns the number of files removed.
    pub async fn clear(&self) -> usize {
        let mut removed = 0;

        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "failed to read cache directory during clear");
                return 0;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_blob = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(BLOB_EXTENSION));
            if !is_blob {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(err) => warn!(path = ?entry.path(), error = %err, "failed to remove blob"),
            }
        }

        removed
    }
}

// == Compression Helpers ==
/// Gzip-compresses a byte buffer.
fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompresses a gzip byte buffer.
fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempdir().unwrap();
        let store = BlobStore::open(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_and_get_roundtrip() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::derive("roundtrip");
        let payload = b"some report payload".repeat(50);

        let compressed_len = store.put(&key, &payload).await.unwrap();
        assert!(compressed_len > 0);

        let read_back = store.get(&key).await.unwrap();
        assert_eq!(read_back, payload);
    }

    #[tokio::test]
    async fn test_compression_shrinks_repetitive_payloads() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::derive("compressible");
        let payload = b"aaaaaaaaaa".repeat(1000);

        let compressed_len = store.put(&key, &payload).await.unwrap();
        assert!(compressed_len < payload.len() as u64);
    }

    #[tokio::test]
    async fn test_get_missing_blob_is_not_found() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::derive("never stored");

        let result = store.get(&key).await;
        assert!(matches!(result, Err(BlobReadError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_corrupt_blob() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::derive("corrupt");

        // Write garbage directly where the blob would live.
        tokio::fs::write(store.blob_path(&key), b"not gzip data")
            .await
            .unwrap();

        let result = store.get(&key).await;
        assert!(matches!(result, Err(BlobReadError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::derive("deleted");

        store.put(&key, b"payload").await.unwrap();
        let first = store.delete(&key).await.unwrap();
        assert!(first.is_some());

        let second = store.delete(&key).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_blob() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::derive("overwrite");

        store.put(&key, b"first version").await.unwrap();
        store.put(&key, b"second version").await.unwrap();

        let read_back = store.get(&key).await.unwrap();
        assert_eq!(read_back, b"second version");
    }

    #[tokio::test]
    async fn test_clear_removes_only_blobs() {
        let (dir, store) = test_store().await;

        store.put(&CacheKey::derive("one"), b"1").await.unwrap();
        store.put(&CacheKey::derive("two"), b"2").await.unwrap();
        tokio::fs::write(dir.path().join("index.json"), b"{}")
            .await
            .unwrap();

        let removed = store.clear().await;
        assert_eq!(removed, 2);

        // Index document survives a blob clear.
        assert!(dir.path().join("index.json").exists());
    }

    #[tokio::test]
    async fn test_clear_empty_directory() {
        let (_dir, store) = test_store().await;
        assert_eq!(store.clear().await, 0);
    }

    #[tokio::test]
    async fn test_list_keys() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::derive("listed");

        store.put(&key, b"payload").await.unwrap();
        let keys = store.list_keys().await.unwrap();
        assert_eq!(keys, vec![key.as_str().to_string()]);
    }
}

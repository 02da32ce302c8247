//! Response DTOs for the cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheStats, CleanupReport, CompressionStats, Lookup};

/// Response body for the GET operation (POST /get)
///
/// On a miss `data` is null and the metadata fields are absent.
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The cached payload, null on a miss
    pub data: Option<serde_json::Value>,
    /// Whether the payload came from the cache
    pub from_cache: bool,
    /// Seconds since the entry was created
    pub age_seconds: Option<i64>,
    /// Reads served from this entry, including this one
    pub hit_count: Option<u64>,
    /// Uncompressed payload size in bytes
    pub size_bytes: Option<u64>,
}

impl From<Lookup<serde_json::Value>> for GetResponse {
    fn from(lookup: Lookup<serde_json::Value>) -> Self {
        Self {
            data: lookup.data,
            from_cache: lookup.from_cache,
            age_seconds: lookup.age_seconds,
            hit_count: lookup.hit_count,
            size_bytes: lookup.size_bytes,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The query that was cached
    pub query: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            message: format!("Report for '{}' cached successfully", query),
            query,
        }
    }
}

/// Response body for the HAS operation (POST /has)
#[derive(Debug, Clone, Serialize)]
pub struct HasResponse {
    /// The probed query
    pub query: String,
    /// Whether a live entry exists
    pub cached: bool,
}

/// Response body for the DELETE operation (DELETE /delete)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// The targeted query
    pub query: String,
    /// Whether an entry was actually removed
    pub deleted: bool,
}

/// Response body for the status endpoint (GET /status)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Number of live entries
    pub total_entries: usize,
    /// Sum of uncompressed payload sizes in bytes
    pub total_size_bytes: u64,
    /// Sum of stored compressed blob sizes in bytes
    pub total_compressed_bytes: u64,
    /// Hit rate over the live index
    pub hit_rate: f64,
    /// Space saved by compression
    pub compression_ratio: f64,
    /// Creation time of the oldest entry, null when empty
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Creation time of the newest entry, null when empty
    pub newest_entry: Option<DateTime<Utc>>,
    /// Approximate in-memory index footprint in bytes
    pub memory_bytes: u64,
}

impl StatusResponse {
    /// Assembles the status view from engine aggregates.
    pub fn new(stats: CacheStats, compression: CompressionStats, memory_bytes: u64) -> Self {
        Self {
            total_entries: stats.total_entries,
            total_size_bytes: stats.total_size_bytes,
            total_compressed_bytes: stats.total_compressed_bytes,
            hit_rate: stats.hit_rate,
            compression_ratio: compression.compression_ratio,
            oldest_entry: stats.oldest_entry,
            newest_entry: stats.newest_entry,
            memory_bytes,
        }
    }
}

/// Response body for the management endpoint (POST /manage)
///
/// Administrative operations report counts rather than erroring: partial
/// completion (some files already gone) is an expected outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ManageResponse {
    /// The action performed
    pub action: String,
    /// Entries or blobs affected
    pub items_affected: usize,
    /// Compressed bytes reclaimed, where applicable
    pub freed_bytes: u64,
    /// Queries found absent (warmup only)
    pub missing: Option<Vec<String>>,
}

impl ManageResponse {
    /// Response for a clear.
    pub fn cleared(removed: usize) -> Self {
        Self {
            action: "clear".to_string(),
            items_affected: removed,
            freed_bytes: 0,
            missing: None,
        }
    }

    /// Response for a targeted delete.
    pub fn deleted(deleted: bool) -> Self {
        Self {
            action: "delete".to_string(),
            items_affected: usize::from(deleted),
            freed_bytes: 0,
            missing: None,
        }
    }

    /// Response for a cleanup sweep.
    pub fn swept(report: CleanupReport) -> Self {
        Self {
            action: "cleanup".to_string(),
            items_affected: report.deleted_count,
            freed_bytes: report.freed_bytes,
            missing: None,
        }
    }

    /// Response for a warmup probe.
    pub fn probed(missing: Vec<String>) -> Self {
        Self {
            action: "warmup".to_string(),
            items_affected: missing.len(),
            freed_bytes: 0,
            missing: Some(missing),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_miss_serializes_null_data() {
        let resp = GetResponse {
            data: None,
            from_cache: false,
            age_seconds: None,
            hit_count: None,
            size_bytes: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["from_cache"], false);
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my query");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my query"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_manage_response_warmup() {
        let resp = ManageResponse::probed(vec!["a".to_string()]);
        assert_eq!(resp.action, "warmup");
        assert_eq!(resp.items_affected, 1);
        assert_eq!(resp.missing.as_deref(), Some(&["a".to_string()][..]));
    }

    #[test]
    fn test_status_response_from_aggregates() {
        let stats = CacheStats {
            total_entries: 2,
            total_size_bytes: 1000,
            total_compressed_bytes: 400,
            total_hits: 4,
            hit_rate: 4.0 / 6.0,
            oldest_entry: None,
            newest_entry: None,
        };
        let compression = CompressionStats {
            total_size_bytes: 1000,
            total_compressed_bytes: 400,
            compression_ratio: 0.6,
        };

        let resp = StatusResponse::new(stats, compression, 512);
        assert_eq!(resp.total_entries, 2);
        assert!((resp.compression_ratio - 0.6).abs() < 1e-9);
        assert_eq!(resp.memory_bytes, 512);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}

//! Error types for the report cache
//!
//! Provides unified error handling using thiserror.
//!
//! Read-path problems (missing or corrupt blobs) are deliberately NOT part
//! of the public error type: the engine normalizes them to cache misses so
//! callers can always fall back to recomputation. Only write-path failures
//! and bad requests surface here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the report cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Disk write, serialization, or compression failure during a store.
    /// Surfaced to the caller so it can decide whether to proceed uncached.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

// == Blob Read Error ==
/// Internal signal for a failed blob read.
///
/// Both variants are treated identically by the engine (cache miss); the
/// distinction only matters for logging and for pruning corrupt entries.
#[derive(Error, Debug)]
pub enum BlobReadError {
    /// No blob file exists for the key. Expected after an unclean shutdown
    /// or an index/store race; not an error condition.
    #[error("blob not found")]
    NotFound,

    /// The blob file exists but could not be read, decompressed, or parsed.
    #[error("corrupt blob: {0}")]
    Corrupt(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the report cache.
pub type Result<T> = std::result::Result<T, CacheError>;

//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::cache::{CacheConfig, ReportCache};
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HasResponse, HealthResponse, ManageAction, ManageRequest,
    ManageResponse, QueryRequest, SetRequest, SetResponse, StatusResponse,
};

/// Application state shared across all handlers.
///
/// Holds the cache engine behind an `Arc`; the engine serializes same-key
/// operations internally, so handlers never lock anything themselves.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache engine
    pub cache: Arc<ReportCache>,
}

impl AppState {
    /// Creates a new AppState around an opened engine.
    pub fn new(cache: ReportCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Opens the engine from configuration (loads and reconciles the
    /// persisted index).
    pub async fn from_config(config: CacheConfig) -> Result<Self> {
        Ok(Self::new(ReportCache::open(config).await?))
    }
}

/// Handler for PUT /set
///
/// Caches a report payload under its query. Storage failures surface as
/// errors so the caller can decide to proceed uncached.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(&req.query, &req.data).await?;

    Ok(Json(SetResponse::new(req.query)))
}

/// Handler for POST /get
///
/// Looks up a cached report. Always responds 200: a miss is a normal
/// outcome carrying `data: null`, never an error.
pub async fn get_handler(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let lookup = state.cache.get::<serde_json::Value>(&req.query).await;

    Ok(Json(lookup.into()))
}

/// Handler for POST /has
///
/// Probes for a live entry without touching hit statistics.
pub async fn has_handler(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<HasResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let cached = state.cache.has(&req.query).await;

    Ok(Json(HasResponse {
        query: req.query,
        cached,
    }))
}

/// Handler for DELETE /delete
///
/// Removes a cached entry. A missing entry reports `deleted: false`
/// rather than an error.
pub async fn delete_handler(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let deleted = state.cache.delete(&req.query).await;

    Ok(Json(DeleteResponse {
        query: req.query,
        deleted,
    }))
}

/// Handler for GET /status
///
/// Administrative view: entry count, sizes, hit rate, compression ratio,
/// oldest/newest entry timestamps, and index memory footprint.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let stats = state.cache.stats().await;
    let compression = state.cache.compression_stats().await;
    let memory_bytes = state.cache.memory_footprint_bytes().await;

    Json(StatusResponse::new(stats, compression, memory_bytes))
}

/// Handler for POST /manage
///
/// Dispatches an administrative action. All actions report affected
/// counts; partial completion is a normal outcome, not a failure.
pub async fn manage_handler(
    State(state): State<AppState>,
    Json(req): Json<ManageRequest>,
) -> Result<Json<ManageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let response = match req.action {
        ManageAction::Clear => ManageResponse::cleared(state.cache.clear().await),
        ManageAction::Delete => {
            // validate() guarantees the target is present
            let query = req.query.unwrap_or_default();
            ManageResponse::deleted(state.cache.delete(&query).await)
        }
        ManageAction::Cleanup => ManageResponse::swept(state.cache.cleanup().await),
        ManageAction::Warmup => {
            let queries = req.queries.unwrap_or_default();
            ManageResponse::probed(state.cache.warmup(&queries).await.missing)
        }
    };

    Ok(Json(response))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    async fn test_state(dir: &tempfile::TempDir) -> AppState {
        let config = CacheConfig {
            directory: dir.path().to_path_buf(),
            ttl: Duration::from_secs(60),
            max_size_mb: 500,
        };
        AppState::from_config(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;

        let req = SetRequest {
            query: "sector outlook".to_string(),
            data: json!({"score": 42}),
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let req = QueryRequest {
            query: "sector outlook".to_string(),
        };
        let response = get_handler(State(state), Json(req)).await.unwrap();
        assert!(response.from_cache);
        assert_eq!(response.data.as_ref().unwrap()["score"], 42);
    }

    #[tokio::test]
    async fn test_get_miss_is_ok_with_null_data() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;

        let req = QueryRequest {
            query: "nothing here".to_string(),
        };
        let response = get_handler(State(state), Json(req)).await.unwrap();
        assert!(!response.from_cache);
        assert!(response.data.is_none());
    }

    #[tokio::test]
    async fn test_delete_handler_reports_missing() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;

        let req = QueryRequest {
            query: "absent".to_string(),
        };
        let response = delete_handler(State(state), Json(req)).await.unwrap();
        assert!(!response.deleted);
    }

    #[tokio::test]
    async fn test_status_handler_empty_cache() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;

        let response = status_handler(State(state)).await;
        assert_eq!(response.total_entries, 0);
        assert!(response.oldest_entry.is_none());
        assert!(response.newest_entry.is_none());
    }

    #[tokio::test]
    async fn test_manage_handler_warmup() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;

        let set = SetRequest {
            query: "cached".to_string(),
            data: json!(1),
        };
        set_handler(State(state.clone()), Json(set)).await.unwrap();

        let req = ManageRequest {
            action: ManageAction::Warmup,
            query: None,
            queries: Some(vec!["cached".to_string(), "absent".to_string()]),
        };
        let response = manage_handler(State(state), Json(req)).await.unwrap();
        assert_eq!(response.missing.as_ref().unwrap(), &vec!["absent".to_string()]);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let dir = tempdir().unwrap();
        let state = test_state(&dir).await;

        let req = SetRequest {
            query: "".to_string(),
            data: json!(null),
        };
        let result = set_handler(State(state), Json(req)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}

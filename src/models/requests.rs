//! Request DTOs for the cache API
//!
//! Defines the structure of incoming HTTP request bodies. Queries are
//! free text and travel in JSON bodies rather than path segments.

use serde::Deserialize;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `query`: The free-text query the report was computed for
/// - `data`: The JSON payload to cache
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The report query
    pub query: String,
    /// The payload to store
    pub data: serde_json::Value,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_query(&self.query)
    }
}

/// Request body for read-style operations (POST /get, POST /has)
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// The report query
    pub query: String,
}

impl QueryRequest {
    /// Validates the request data
    pub fn validate(&self) -> Option<String> {
        validate_query(&self.query)
    }
}

/// Administrative action selector for POST /manage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManageAction {
    /// Remove every entry and blob
    Clear,
    /// Remove the entry for `query`
    Delete,
    /// Sweep expired entries and orphan blobs now
    Cleanup,
    /// Probe which of `queries` are absent
    Warmup,
}

/// Request body for the management endpoint (POST /manage)
#[derive(Debug, Clone, Deserialize)]
pub struct ManageRequest {
    /// The operation to perform
    pub action: ManageAction,
    /// Target query for `delete`
    #[serde(default)]
    pub query: Option<String>,
    /// Target queries for `warmup`
    #[serde(default)]
    pub queries: Option<Vec<String>>,
}

impl ManageRequest {
    /// Validates action-specific required fields.
    pub fn validate(&self) -> Option<String> {
        match self.action {
            ManageAction::Delete => match &self.query {
                Some(query) => validate_query(query),
                None => Some("'delete' requires a 'query' field".to_string()),
            },
            ManageAction::Warmup => match &self.queries {
                Some(queries) if queries.is_empty() => {
                    Some("'warmup' requires at least one query".to_string())
                }
                Some(_) => None,
                None => Some("'warmup' requires a 'queries' field".to_string()),
            },
            ManageAction::Clear | ManageAction::Cleanup => None,
        }
    }
}

/// Shared query validation: non-empty after trimming.
fn validate_query(query: &str) -> Option<String> {
    if query.trim().is_empty() {
        return Some("Query cannot be empty".to_string());
    }
    None
}

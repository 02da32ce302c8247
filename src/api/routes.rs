//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, has_handler, health_handler, manage_handler, set_handler,
    status_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /set` - Cache a report payload under its query
/// - `POST /get` - Look up a cached report (miss responds 200 with null data)
/// - `POST /has` - Probe for a live entry
/// - `DELETE /delete` - Remove an entry
/// - `GET /status` - Cache statistics and memory footprint
/// - `POST /manage` - Administrative actions (clear, delete, cleanup, warmup)
/// - `GET /health` - Health check endpoint
///
/// Queries are free text, so read-style operations carry them in JSON
/// bodies instead of path segments.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/set", put(set_handler))
        .route("/get", post(get_handler))
        .route("/has", post(has_handler))
        .route("/delete", delete(delete_handler))
        .route("/status", get(status_handler))
        .route("/manage", post(manage_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! API Module
//!
//! HTTP handlers and routing for the cache REST API.
//!
//! # Endpoints
//! - `PUT /set` - Cache a report payload under its query
//! - `POST /get` - Look up a cached report
//! - `POST /has` - Probe for a live entry
//! - `DELETE /delete` - Remove an entry
//! - `GET /status` - Cache statistics and memory footprint
//! - `POST /manage` - Administrative actions
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

//! Report Cache - a compressed, TTL-based persistent cache
//!
//! Backs an analytics dashboard that produces expensive multi-source
//! reports keyed by free-text query. Payloads are gzip-compressed to one
//! blob file per key; entry metadata lives in an in-memory index mirrored
//! to a single JSON document and reconciled against disk state at startup.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheConfig, ReportCache};
pub use config::Config;
pub use tasks::spawn_reaper_task;

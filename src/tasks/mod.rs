//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiration reaper: sweeps expired entries and orphan blobs at
//!   configured intervals, with one sweep at startup

mod reaper;

pub use reaper::spawn_reaper_task;

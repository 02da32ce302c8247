//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for blob files and the index document
    pub directory: PathBuf,
    /// Entry time-to-live in days
    pub ttl_days: u64,
    /// Background reaper interval in hours
    pub cleanup_interval_hours: u64,
    /// Advisory cap on total compressed size in megabytes (not enforced by eviction)
    pub max_size_mb: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Storage root (default: ".report-cache")
    /// - `CACHE_TTL_DAYS` - Entry TTL in days (default: 7)
    /// - `CLEANUP_INTERVAL_HOURS` - Reaper frequency in hours (default: 24)
    /// - `MAX_CACHE_SIZE_MB` - Advisory size cap in MB (default: 500)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self {
            directory: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".report-cache")),
            ttl_days: env::var("CACHE_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            cleanup_interval_hours: env::var("CLEANUP_INTERVAL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            max_size_mb: env::var("MAX_CACHE_SIZE_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        }
    }

    /// Entry TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days * 24 * 3600)
    }

    /// Reaper interval in seconds.
    pub fn cleanup_interval_secs(&self) -> u64 {
        self.cleanup_interval_hours * 3600
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".report-cache"),
            ttl_days: 7,
            cleanup_interval_hours: 24,
            max_size_mb: 500,
            server_port: 3000,
        }
    }
}

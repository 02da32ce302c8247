//! Expiration Reaper Task
//!
//! Background task that periodically sweeps expired cache entries and
//! orphan blobs, keeping disk usage bounded.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ReportCache;

/// Spawns the background reaper.
///
/// The first sweep runs immediately, so entries gone stale during a long
/// downtime are purged at startup rather than a full interval later;
/// subsequent sweeps run every `interval_secs`.
///
/// # Arguments
/// * `cache` - Shared engine instance
/// * `interval_secs` - Seconds between sweeps
///
/// # Returns
/// A JoinHandle used to abort the task during graceful shutdown, so the
/// timer never keeps the process alive.
pub fn spawn_reaper_task(cache: Arc<ReportCache>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "starting expiration reaper");

        loop {
            let report = cache.cleanup().await;

            if report.deleted_count > 0 {
                info!(
                    deleted = report.deleted_count,
                    freed_bytes = report.freed_bytes,
                    "reaper removed expired entries"
                );
            } else {
                debug!("reaper found nothing to remove");
            }

            tokio::time::sleep(interval).await;
        }
    })
}

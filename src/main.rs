//! Report Cache - a compressed, TTL-based persistent cache server
//!
//! Serves cached analytics reports over HTTP with background expiration.

mod api;
mod cache;
mod config;
mod error;
mod models;
mod tasks;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use cache::{CacheConfig, ReportCache};
use config::Config;
use tasks::spawn_reaper_task;

/// Main entry point for the report cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache engine (load + reconcile the persisted index)
/// 4. Start the background expiration reaper
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "report_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Report Cache Server");

    // Load configuration from environment variables
    let config = Config::from_env();
    info!(
        "Configuration loaded: directory={}, ttl_days={}, cleanup_interval_hours={}, max_size_mb={}, port={}",
        config.directory.display(),
        config.ttl_days,
        config.cleanup_interval_hours,
        config.max_size_mb,
        config.server_port
    );

    // Open the cache engine; the directory is owned exclusively by this
    // process (no file locking), so one instance per directory.
    let cache = ReportCache::open(CacheConfig::from(&config))
        .await
        .context("failed to open cache")?;
    let cache = Arc::new(cache);

    // Start background reaper (first sweep runs immediately)
    let reaper_handle = spawn_reaper_task(Arc::clone(&cache), config.cleanup_interval_secs());
    info!("Background reaper started");

    // Create router with all endpoints
    let state = AppState { cache };
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(reaper_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the reaper task so its timer does not keep
/// the process alive, then allows graceful shutdown.
async fn shutdown_signal(reaper_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Abort the reaper task
    reaper_handle.abort();
    warn!("Reaper task aborted");
}

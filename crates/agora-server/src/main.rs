//! # agora-server
//!
//! HTTP front for the course forum.
//!
//! This binary provides:
//! - **Media proxy** at `/api/media/*path` that resolves uploaded files
//!   against several backend URL layouts, in a fixed fallback order
//! - **Metrics** at `/api/metrics` in the Prometheus text format
//! - **Health check** at `/health`

mod api;
mod config;
mod error;
mod media;
mod metrics;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::media::{HttpMediaFetcher, MediaProxy};
use crate::metrics::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_server=debug")),
        )
        .init();

    info!("Starting Agora server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    info!(
        api = %config.api_base_url,
        media = %config.media_base_url,
        timeout = ?config.media_fetch_timeout(),
        "Media upstreams"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let metrics = Metrics::new();

    let proxy = MediaProxy::new(
        HttpMediaFetcher::new()?,
        config.api_base_url.clone(),
        config.media_base_url.clone(),
        config.media_fetch_timeout(),
        metrics.clone(),
    );

    let http_addr = config.http_addr;
    let app_state = AppState {
        proxy: Arc::new(proxy),
        metrics,
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

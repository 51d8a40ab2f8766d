// =============================================================================
// Trade Analytics — Main Entry Point
// =============================================================================
//
// Serves `GET /trade-analytics/:ticker`: fetches the trailing daily candles
// from the aggregates provider, computes RSI / VWAP / MACD, and answers with a
// BUY / SELL / HOLD recommendation. Requests are independent; the process
// holds no mutable state.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod error;
mod indicators;
mod market_data;
mod polygon;
mod runtime_config;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var("TRADE_ANALYTICS_CONFIG")
        .unwrap_or_else(|_| "runtime_config.json".into());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env()?;
    config.validate()?;

    info!(
        upstream = %config.upstream_base_url,
        lookback_days = config.lookback_days,
        default_api_key = config.default_api_key.is_some(),
        "Configuration ready"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::from_config(&config)?);

    let static_dir = config.serve_static.then(|| PathBuf::from(&config.static_dir));
    if let Some(dir) = &static_dir {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Static directory not found — static routes will 404");
        }
    }

    // ── 3. Start the API server ──────────────────────────────────────────
    let app = api::rest::router(state, static_dir.as_deref());
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "Trade analytics server listening");

    // ── 4. Serve until Ctrl+C ────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("Trade analytics server shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received — stopping gracefully");
}

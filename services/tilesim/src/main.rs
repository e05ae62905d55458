use std::sync::Arc;

use anyhow::{Context, Result};
use tilesim::{AppState, SimConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = SimConfig::from_env()?;
    info!(
        tick_ms = cfg.tick.as_millis() as u64,
        tiles_per_tick = cfg.tiles_per_tick,
        max_tiles = cfg.max_tiles,
        "simulated tile backend"
    );

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind_addr))?;

    let state = Arc::new(AppState::new(cfg));

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutting down");
                shutdown.cancel();
            }
            Err(e) => warn!("ctrl-c handler failed: {e}"),
        }
    });

    tilesim::serve(listener, state).await
}

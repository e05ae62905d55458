//! Simulated MBTiles download backend.
//!
//! Serves the same REST surface as the real tile server, with sessions
//! that progress on a timer instead of fetching tiles.

pub mod config;
pub mod error;
pub mod routes_download;
pub mod routes_files;
pub mod routes_health;
pub mod routes_progress;
pub mod session;
pub mod simulator;
pub mod state;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use config::SimConfig;
pub use state::{AppState, SharedState};

pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(routes_health::health))
        .route("/api/health", get(routes_health::health))
        .route("/check_qgis", get(routes_health::check_qgis))
        .route("/api/check_qgis", get(routes_health::check_qgis))
        .route("/api/tile-sources", get(routes_health::tile_sources))
        .route("/download_mbtiles", post(routes_download::download_mbtiles))
        .route("/api/download_mbtiles", post(routes_download::download_mbtiles))
        .route("/api/download-mbtiles", post(routes_download::api_download_mbtiles))
        .route("/progress/:session_id", get(routes_progress::get_progress))
        .route("/api/progress/:session_id", get(routes_progress::get_progress))
        .route("/cleanup_session/:session_id", post(routes_progress::cleanup_session))
        .route("/download_file/:filename", get(routes_files::download_file))
        .route("/api/download_file/:filename", get(routes_files::download_file))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves until `state.shutdown` is cancelled.
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, "tilesim listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server error")
}

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tilejob::TileSource;

use crate::state::SharedState;

pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    let now = chrono::Utc::now();
    Json(json!({
        "status": "healthy",
        "timestamp": now.timestamp_millis() as f64 / 1000.0,
        "active_sessions": state.session_count().await,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn check_qgis() -> Json<Value> {
    Json(json!({
        "qgis_status": "Simulated tile download available",
        "manual_method_available": true,
        "tile_algorithms": [],
    }))
}

pub async fn tile_sources() -> Json<Value> {
    let sources: Vec<&str> = TileSource::ALL.iter().map(|s| s.as_str()).collect();
    Json(json!({
        "sources": sources,
        "descriptions": {
            "openstreetmap": "Open Street Map - Free and open source",
            "satellite": "Satellite imagery - High resolution",
            "terrain": "Terrain map - Topographical features",
        },
    }))
}

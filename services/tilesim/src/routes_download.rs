use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tilejob::filename::sanitize;
use tilejob::wire::{BoundsPayload, CenterBufferPayload};
use tilejob::TileSource;
use tilemath::{BoundingBox, ZoomRange, MAX_ZOOM, MIN_ZOOM};

use crate::error::{api_error, ApiError};
use crate::simulator::start_session;
use crate::state::SharedState;

const MIN_BUFFER: f64 = 0.001;
const MAX_BUFFER: f64 = 0.1;

/// `POST /download_mbtiles`: centre point plus buffer.
pub async fn download_mbtiles(
    State(state): State<SharedState>,
    payload: Result<Json<CenterBufferPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(p) = payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    if !(-90.0..=90.0).contains(&p.lat) || !(-180.0..=180.0).contains(&p.lon) {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid coordinates"));
    }
    let zoom = zoom_range(p.min_zoom, p.max_zoom)?;
    if !(MIN_BUFFER..=MAX_BUFFER).contains(&p.buffer) {
        return Err(api_error(StatusCode::BAD_REQUEST, "Buffer must be between 0.001 and 0.1 degrees"));
    }
    let bounds = BoundingBox::around(p.lat, p.lon, p.buffer)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let session = start_session(&state, bounds, zoom, TileSource::Satellite, output_name(&p.filename)).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "Download started",
            "session_id": session.session_id,
            "message": "Use the session ID to track progress",
            "estimated_tiles": session.total_tiles,
            "coordinates": {"lat": p.lat, "lon": p.lon},
            "zoom_range": {"min": zoom.min(), "max": zoom.max()},
        })),
    ))
}

/// `POST /api/download-mbtiles`: explicit bounds.
pub async fn api_download_mbtiles(
    State(state): State<SharedState>,
    payload: Result<Json<BoundsPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(p) = payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let b = p.bounds;
    let in_range = [b.north, b.south].iter().all(|v| (-90.0..=90.0).contains(v))
        && [b.east, b.west].iter().all(|v| (-180.0..=180.0).contains(v));
    if !in_range {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid coordinates"));
    }
    let bounds = BoundingBox::new(b.north, b.south, b.east, b.west)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    let zoom = zoom_range(p.min_zoom, p.max_zoom)?;

    let session = start_session(&state, bounds, zoom, p.tile_source, output_name(&p.output_name)).await;

    Ok(Json(json!({
        "success": true,
        "download_id": session.session_id,
        "message": "Download started",
        "status": "downloading",
        "estimated_tiles": session.total_tiles,
    })))
}

fn zoom_range(min: u8, max: u8) -> Result<ZoomRange, ApiError> {
    let in_range = |z: u8| (MIN_ZOOM..=MAX_ZOOM).contains(&z);
    if !in_range(min) || !in_range(max) || min > max {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid zoom levels"));
    }
    ZoomRange::new(min, max).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

fn output_name(requested: &str) -> String {
    let name = sanitize(requested);
    if name.is_empty() {
        format!("output_{}", chrono::Utc::now().timestamp())
    } else {
        name
    }
}

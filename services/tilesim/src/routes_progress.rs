use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::error::{api_error, ApiError};
use crate::session::ProgressBody;
use crate::state::SharedState;

pub async fn get_progress(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<ProgressBody>, ApiError> {
    let session = state
        .get_session(&session_id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Session not found"))?;
    Ok(Json(session.progress(chrono::Utc::now())))
}

pub async fn cleanup_session(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.remove_session(&session_id).await {
        Some(removed) => {
            info!(session_id=%session_id, status=?removed.status, "session cleaned up");
            Ok(Json(json!({ "status": "Session cleaned up successfully" })))
        }
        None => Err(api_error(StatusCode::NOT_FOUND, "Session not found")),
    }
}

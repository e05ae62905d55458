use axum::{http::StatusCode, Json};
use serde_json::Value;

/// Every failing handler answers `{"error": "..."}`.
pub type ApiError = (StatusCode, Json<Value>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::error::{api_error, ApiError};
use crate::state::SharedState;

pub async fn download_file(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !filename.ends_with(".mbtiles") {
        return Err(api_error(StatusCode::NOT_FOUND, "File not found"));
    }
    let body = state
        .get_artifact(&filename)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "File not found"))?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ];
    Ok((headers, body))
}

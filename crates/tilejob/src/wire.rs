//! Request/response bodies of the tile backend and the mapping from a
//! [`DownloadRequest`] onto whichever shape the backend speaks.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tilemath::BoundingBox;

use crate::error::JobError;
use crate::form::DownloadRequest;
use crate::types::{JobHandle, TileSource};

/// Which of the two submission shapes the backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestShape {
    /// `{lat, lon, buffer, min_zoom, max_zoom, filename}` on `/download_mbtiles`.
    #[default]
    CenterBuffer,
    /// `{bounds, minZoom, maxZoom, tileSource, outputName}` on `/api/download-mbtiles`.
    Bounds,
}

impl FromStr for RequestShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" | "center_buffer" | "center-buffer" | "legacy" => Ok(RequestShape::CenterBuffer),
            "bounds" | "api" => Ok(RequestShape::Bounds),
            other => Err(format!("unknown request shape: {other}")),
        }
    }
}

impl RequestShape {
    pub fn submit_path(&self) -> &'static [&'static str] {
        match self {
            RequestShape::CenterBuffer => &["download_mbtiles"],
            RequestShape::Bounds => &["api", "download-mbtiles"],
        }
    }

    pub fn capabilities_path(&self) -> &'static [&'static str] {
        match self {
            RequestShape::CenterBuffer => &["check_qgis"],
            RequestShape::Bounds => &["api", "tile-sources"],
        }
    }

    pub fn payload(&self, req: &DownloadRequest) -> serde_json::Value {
        let body = match self {
            RequestShape::CenterBuffer => serde_json::to_value(CenterBufferPayload {
                lat: req.lat,
                lon: req.lon,
                buffer: req.buffer,
                min_zoom: req.zoom.min(),
                max_zoom: req.zoom.max(),
                filename: req.output_name.clone(),
            }),
            RequestShape::Bounds => serde_json::to_value(BoundsPayload {
                bounds: req.bounds,
                min_zoom: req.zoom.min(),
                max_zoom: req.zoom.max(),
                tile_source: req.tile_source,
                output_name: req.output_name.clone(),
            }),
        };
        // plain structs of numbers and strings always serialize
        body.unwrap_or_default()
    }
}

pub const HEALTH_PATH: &[&str] = &["health"];

pub fn progress_path(handle: &JobHandle) -> [&str; 2] {
    ["progress", handle.as_str()]
}

pub fn download_file_path(file_name: &str) -> [&str; 2] {
    ["download_file", file_name]
}

pub fn cleanup_path(handle: &JobHandle) -> [&str; 2] {
    ["cleanup_session", handle.as_str()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterBufferPayload {
    pub lat: f64,
    pub lon: f64,
    pub buffer: f64,
    pub min_zoom: u8,
    pub max_zoom: u8,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsPayload {
    pub bounds: BoundingBox,
    pub min_zoom: u8,
    pub max_zoom: u8,
    #[serde(default)]
    pub tile_source: TileSource,
    #[serde(default)]
    pub output_name: String,
}

/// Body of a submission response, successful or not.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, alias = "download_id")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub estimated_tiles: Option<u64>,
}

impl SubmitResponse {
    pub fn into_handle(self, status: Option<u16>) -> Result<JobHandle, JobError> {
        if let Some(message) = self.error {
            return Err(JobError::Backend { status, message });
        }
        if self.success == Some(false) {
            let message = self.message.unwrap_or_else(|| "tile server rejected the request".to_string());
            return Err(JobError::Backend { status, message });
        }
        match self.session_id {
            Some(id) if !id.is_empty() => Ok(JobHandle::new(id)),
            _ => Err(JobError::Backend {
                status,
                message: "tile server response did not include a session id".to_string(),
            }),
        }
    }
}

/// Generic `{error}` body used by every endpoint on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

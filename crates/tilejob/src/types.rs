use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileSource {
    #[default]
    Satellite,
    OpenStreetMap,
    Terrain,
}

impl TileSource {
    pub const ALL: [TileSource; 3] = [TileSource::Satellite, TileSource::OpenStreetMap, TileSource::Terrain];

    pub fn as_str(&self) -> &'static str {
        match self {
            TileSource::Satellite => "satellite",
            TileSource::OpenStreetMap => "openstreetmap",
            TileSource::Terrain => "terrain",
        }
    }
}

impl FromStr for TileSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "satellite" => Ok(TileSource::Satellite),
            "openstreetmap" | "osm" => Ok(TileSource::OpenStreetMap),
            "terrain" => Ok(TileSource::Terrain),
            other => Err(format!("unknown tile source: {other}")),
        }
    }
}

impl std::fmt::Display for TileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque session id handed out by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job state as reported by `/progress`.
///
/// Backends disagree on names (`idle`, `downloading`, `failed`); those are
/// folded into the four canonical states. Anything else is kept as
/// `Unknown` and treated as still in flight.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Error,
    Unknown(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
            JobStatus::Unknown(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "pending" | "idle" | "queued" => JobStatus::Pending,
            "running" | "downloading" => JobStatus::Running,
            "completed" | "done" => JobStatus::Completed,
            "error" | "failed" => JobStatus::Error,
            _ => JobStatus::Unknown(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(s: JobStatus) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `/progress/{session_id}` response. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub total_tiles: u64,
    #[serde(default)]
    pub downloaded_tiles: u64,
    #[serde(default)]
    pub current_zoom: u8,
    #[serde(default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub tiles_per_second: f64,
    /// Seconds.
    #[serde(default)]
    pub estimated_remaining_time: u64,
    /// Seconds.
    #[serde(default)]
    pub elapsed_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_ago: Option<u64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tiles_per_zoom: BTreeMap<u8, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl ProgressSnapshot {
    /// File name of the produced artifact, without any server-side directory.
    pub fn artifact_name(&self) -> Option<&str> {
        let path = self.output_file.as_deref()?;
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        (!name.is_empty()).then_some(name)
    }
}

/// `/check_qgis` or `/api/tile-sources` response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub qgis_status: Option<String>,
    #[serde(default)]
    pub manual_method_available: Option<bool>,
    #[serde(default)]
    pub tile_algorithms: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
}

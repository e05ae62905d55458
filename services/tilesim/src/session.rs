use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tilejob::TileSource;
use tilemath::{BoundingBox, ZoomRange};

/// Status names as this backend reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Downloading,
    Completed,
    Error,
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session_id: String,
    pub status: SessionStatus,
    pub bounds: BoundingBox,
    pub zoom: ZoomRange,
    pub tile_source: TileSource,
    pub output_name: String,

    pub total_tiles: u64,
    pub downloaded_tiles: u64,
    pub current_zoom: u8,
    pub tiles_per_zoom: BTreeMap<u8, u64>,

    pub error: Option<String>,
    pub output_file: Option<String>,
    pub display_name: Option<String>,
    pub file_size_bytes: u64,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
}

/// Body of `GET /progress/{session_id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressBody {
    pub session_id: String,
    pub status: SessionStatus,
    pub total_tiles: u64,
    pub downloaded_tiles: u64,
    pub current_zoom: u8,
    pub progress_percent: f64,
    pub tiles_per_second: f64,
    pub estimated_remaining_time: u64,
    pub elapsed_time: u64,
    pub error: Option<String>,
    pub output_file: Option<String>,
    pub display_name: Option<String>,
    pub file_size_bytes: u64,
    pub last_update_ago: u64,
    pub tiles_per_zoom: BTreeMap<u8, u64>,
    pub method: &'static str,
}

impl SessionRecord {
    pub fn new(
        session_id: String,
        bounds: BoundingBox,
        zoom: ZoomRange,
        tile_source: TileSource,
        output_name: String,
        per_zoom: &[(u8, u64)],
        now: DateTime<Utc>,
    ) -> Self {
        let tiles_per_zoom: BTreeMap<u8, u64> = per_zoom.iter().copied().collect();
        Self {
            session_id,
            status: SessionStatus::Idle,
            bounds,
            zoom,
            tile_source,
            output_name,
            total_tiles: tiles_per_zoom.values().sum(),
            downloaded_tiles: 0,
            current_zoom: zoom.min(),
            tiles_per_zoom,
            error: None,
            output_file: None,
            display_name: None,
            file_size_bytes: 0,
            started_at: None,
            finished_at: None,
            last_update: now,
        }
    }

    /// Zoom level the next tile belongs to.
    pub fn zoom_at(&self, downloaded: u64) -> u8 {
        let mut seen = 0u64;
        for (&zoom, &count) in &self.tiles_per_zoom {
            seen += count;
            if downloaded < seen {
                return zoom;
            }
        }
        self.zoom.max()
    }

    pub fn progress(&self, now: DateTime<Utc>) -> ProgressBody {
        let progress_percent = if self.total_tiles > 0 {
            round1(self.downloaded_tiles as f64 / self.total_tiles as f64 * 100.0)
        } else {
            0.0
        };

        let (elapsed_time, tiles_per_second, estimated_remaining_time) = match self.started_at {
            Some(start) if self.downloaded_tiles > 0 => {
                let until = self.finished_at.unwrap_or(now);
                let elapsed = (until - start).num_milliseconds().max(1) as f64 / 1000.0;
                let rate = self.downloaded_tiles as f64 / elapsed;
                let remaining = self.total_tiles.saturating_sub(self.downloaded_tiles) as f64 / rate;
                (elapsed.round() as u64, round1(rate), remaining.round() as u64)
            }
            _ => (0, 0.0, 0),
        };

        ProgressBody {
            session_id: self.session_id.clone(),
            status: self.status,
            total_tiles: self.total_tiles,
            downloaded_tiles: self.downloaded_tiles,
            current_zoom: self.current_zoom,
            progress_percent,
            tiles_per_second,
            estimated_remaining_time,
            elapsed_time,
            error: self.error.clone(),
            output_file: self.output_file.clone(),
            display_name: self.display_name.clone(),
            file_size_bytes: self.file_size_bytes,
            last_update_ago: (now - self.last_update).num_seconds().max(0) as u64,
            tiles_per_zoom: self.tiles_per_zoom.clone(),
            method: "simulated",
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

use std::str::FromStr;

use serde::Serialize;

use crate::{Result, TileMathError, ZoomRange};

/// How the number of tiles along one side of the box is predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileFormula {
    /// `ceil(buffer * 2^z * km_per_degree / km_per_tile)`
    #[default]
    GroundResolution,
    /// `ceil(buffer * 2 * 2^z)`
    DegreeGrid,
}

impl FromStr for TileFormula {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ground" | "ground_resolution" | "ground-resolution" => Ok(Self::GroundResolution),
            "degree" | "degree_grid" | "degree-grid" => Ok(Self::DegreeGrid),
            other => Err(format!("unknown tile formula: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    pub formula: TileFormula,
    /// Degree-to-km factor at the equator; no latitude correction.
    pub km_per_degree: f64,
    /// Ground width assumed for one tile.
    pub km_per_tile: f64,
    /// Average encoded tile size.
    pub kb_per_tile: f64,
    /// Platform ceiling on the reported tile count.
    pub tile_cap: Option<u64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            formula: TileFormula::GroundResolution,
            km_per_degree: 111.0,
            km_per_tile: 0.15,
            kb_per_tile: 15.0,
            tile_cap: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoomEstimate {
    pub zoom: u8,
    pub tiles_per_side: u64,
    pub tiles: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    /// Uncapped prediction.
    pub total_tiles: u64,
    /// `total_tiles`, bounded by the configured cap.
    pub reported_tiles: u64,
    /// Derived from `reported_tiles`.
    pub estimated_size_mb: u64,
    pub area_size_km: u64,
    pub is_limited: bool,
    pub per_zoom: Vec<ZoomEstimate>,
}

/// Predicts the cost of downloading a square of half-width `buffer` degrees
/// over every level of `zoom`.
pub fn estimate(buffer: f64, zoom: ZoomRange, cfg: &EstimatorConfig) -> Result<Estimate> {
    if !buffer.is_finite() || buffer <= 0.0 {
        return Err(TileMathError::InvalidBuffer(buffer));
    }

    let mut total: u64 = 0;
    let mut per_zoom = Vec::with_capacity(zoom.level_count());

    for z in zoom.levels() {
        let side = tiles_per_side(buffer, z, cfg);
        let tiles = side.saturating_mul(side);
        total = total.saturating_add(tiles);
        per_zoom.push(ZoomEstimate { zoom: z, tiles_per_side: side, tiles });
    }

    let (reported, is_limited) = match cfg.tile_cap {
        Some(cap) if total > cap => (cap, true),
        _ => (total, false),
    };

    Ok(Estimate {
        total_tiles: total,
        reported_tiles: reported,
        estimated_size_mb: (reported as f64 * cfg.kb_per_tile / 1024.0).round() as u64,
        area_size_km: (buffer * cfg.km_per_degree).round() as u64,
        is_limited,
        per_zoom,
    })
}

fn tiles_per_side(buffer: f64, zoom: u8, cfg: &EstimatorConfig) -> u64 {
    let scale = 2f64.powi(i32::from(zoom));
    let side = match cfg.formula {
        TileFormula::GroundResolution => buffer * scale * cfg.km_per_degree / cfg.km_per_tile,
        TileFormula::DegreeGrid => buffer * 2.0 * scale,
    };
    side.ceil() as u64
}

//! Tile arithmetic for offline map packages
//!
//! Bounding boxes, zoom ranges and the estimator that predicts how many
//! raster tiles (and how many megabytes) a request will cost.

mod bounds;
mod estimate;
mod mercator;
mod zoom;

pub use bounds::BoundingBox;
pub use estimate::{estimate, Estimate, EstimatorConfig, TileFormula, ZoomEstimate};
pub use mercator::{tile_xy, tiles_in_bounds, tiles_in_range, MERCATOR_MAX_LAT};
pub use zoom::{ZoomRange, MAX_ZOOM, MIN_ZOOM};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TileMathError {
    #[error("buffer must be a positive number of degrees, got {0}")]
    InvalidBuffer(f64),

    #[error("north ({north}) must be greater than south ({south})")]
    InvalidBounds { north: f64, south: f64 },

    #[error("zoom level {0} is outside {MIN_ZOOM}..={MAX_ZOOM}")]
    ZoomOutOfRange(u8),

    #[error("min zoom {min} is greater than max zoom {max}")]
    ZoomOrder { min: u8, max: u8 },
}

pub type Result<T> = std::result::Result<T, TileMathError>;

use serde::{Deserialize, Serialize};

use crate::{Result, TileMathError};

/// Rectangular region in decimal degrees.
///
/// `east` is not required to exceed `west`; boxes crossing the 180° line are
/// not supported and are counted as if they did not wrap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        if !(north > south) {
            return Err(TileMathError::InvalidBounds { north, south });
        }
        Ok(Self { north, south, east, west })
    }

    /// Square box of half-width `buffer` around a centre point.
    pub fn around(lat: f64, lon: f64, buffer: f64) -> Result<Self> {
        if !buffer.is_finite() || buffer <= 0.0 {
            return Err(TileMathError::InvalidBuffer(buffer));
        }
        Self::new(lat + buffer, lat - buffer, lon + buffer, lon - buffer)
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }
}

use chrono::NaiveDate;
use serde::Serialize;
use tilemath::{BoundingBox, ZoomRange, MAX_ZOOM, MIN_ZOOM};

use crate::error::ValidationError;
use crate::filename::resolve_output_name;
use crate::types::TileSource;

/// Raw form input, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct DownloadForm {
    pub latitude: String,
    pub longitude: String,
    pub buffer: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub tile_source: TileSource,
    pub output_name: String,
}

/// A validated request, ready to be mapped onto a wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub lat: f64,
    pub lon: f64,
    pub buffer: f64,
    pub bounds: BoundingBox,
    pub zoom: ZoomRange,
    pub tile_source: TileSource,
    pub output_name: String,
}

impl DownloadForm {
    /// Checks run in order, stopping at the first failure:
    /// numbers parse, coordinates in range, zoom order, then buffer and zoom
    /// bounds.
    pub fn validate(&self, today: NaiveDate) -> Result<DownloadRequest, ValidationError> {
        let lat = parse_finite("latitude", &self.latitude)?;
        let lon = parse_finite("longitude", &self.longitude)?;
        let buffer = parse_finite("buffer", &self.buffer)?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::LongitudeOutOfRange(lon));
        }

        if self.min_zoom > self.max_zoom {
            return Err(ValidationError::ZoomOrder { min: self.min_zoom, max: self.max_zoom });
        }

        if buffer <= 0.0 {
            return Err(ValidationError::BufferNotPositive(buffer));
        }
        for z in [self.min_zoom, self.max_zoom] {
            if !(MIN_ZOOM..=MAX_ZOOM).contains(&z) {
                return Err(ValidationError::ZoomOutOfRange(z));
            }
        }

        let zoom = ZoomRange::new(self.min_zoom, self.max_zoom)
            .map_err(|_| ValidationError::ZoomOrder { min: self.min_zoom, max: self.max_zoom })?;
        let bounds =
            BoundingBox::around(lat, lon, buffer).map_err(|_| ValidationError::BufferNotPositive(buffer))?;

        Ok(DownloadRequest {
            lat,
            lon,
            buffer,
            bounds,
            zoom,
            tile_source: self.tile_source,
            output_name: resolve_output_name(&self.output_name, lat, lon, zoom, today),
        })
    }
}

fn parse_finite(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::NotANumber { field }),
    }
}

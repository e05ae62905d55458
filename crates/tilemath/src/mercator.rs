//! Web-Mercator (slippy map) tile arithmetic.
//!
//! Unlike the estimator this counts the tiles a tile server will actually
//! serve for a box, so it is what a backend uses to size a job.

use std::f64::consts::PI;

use crate::{BoundingBox, ZoomRange};

/// Latitude limit of the Web-Mercator projection.
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_78;

/// Column and row of the tile containing a point.
pub fn tile_xy(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let n = 2f64.powi(i32::from(zoom));
    let lat_rad = lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let lon = lon.clamp(-180.0, 180.0);

    let max_index = n - 1.0;
    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, max_index);
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor().clamp(0.0, max_index);
    (x as u32, y as u32)
}

/// Number of tiles covering `bounds` at one zoom level.
pub fn tiles_in_bounds(bounds: &BoundingBox, zoom: u8) -> u64 {
    let (min_x, max_y) = tile_xy(bounds.south, bounds.west, zoom);
    let (max_x, min_y) = tile_xy(bounds.north, bounds.east, zoom);

    let cols = u64::from(max_x.abs_diff(min_x)) + 1;
    let rows = u64::from(max_y.abs_diff(min_y)) + 1;
    cols * rows
}

/// Per-zoom tile counts and their sum.
pub fn tiles_in_range(bounds: &BoundingBox, zoom: ZoomRange) -> (u64, Vec<(u8, u64)>) {
    let per_zoom: Vec<(u8, u64)> = zoom
        .levels()
        .map(|z| (z, tiles_in_bounds(bounds, z)))
        .collect();
    let total = per_zoom.iter().map(|(_, n)| n).sum();
    (total, per_zoom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_york_city_at_zoom_16() {
        assert_eq!(tile_xy(40.7128, -74.0060, 16), (19295, 24640));
    }

    #[test]
    fn whole_world_at_zoom_zero_is_one_tile() {
        let b = BoundingBox::new(80.0, -80.0, 179.0, -179.0).unwrap();
        assert_eq!(tiles_in_bounds(&b, 0), 1);
    }

    #[test]
    fn clamps_poles_and_date_line() {
        assert_eq!(tile_xy(90.0, 180.0, 2), (3, 0));
        assert_eq!(tile_xy(-90.0, -180.0, 2), (0, 3));
    }

    #[test]
    fn small_box_over_reference_range() {
        let b = BoundingBox::around(40.7128, -74.0060, 0.005).unwrap();
        let (total, per_zoom) = tiles_in_range(&b, ZoomRange::new(10, 16).unwrap());
        let counts: Vec<u64> = per_zoom.iter().map(|(_, n)| *n).collect();
        assert_eq!(counts, vec![2, 4, 4, 4, 4, 4, 9]);
        assert_eq!(total, 31);
    }

    #[test]
    fn box_straddling_origin_touches_four_tiles() {
        let b = BoundingBox::around(0.0, 0.0, 0.05).unwrap();
        for z in 1..=3 {
            assert_eq!(tiles_in_bounds(&b, z), 4);
        }
    }
}

use serde::Serialize;

use crate::{Result, TileMathError};

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 21;

/// Inclusive zoom range, always `min <= max` and within `MIN_ZOOM..=MAX_ZOOM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoomRange {
    min: u8,
    max: u8,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 10, max: 16 }
    }
}

impl ZoomRange {
    pub fn new(min: u8, max: u8) -> Result<Self> {
        for z in [min, max] {
            if !(MIN_ZOOM..=MAX_ZOOM).contains(&z) {
                return Err(TileMathError::ZoomOutOfRange(z));
            }
        }
        if min > max {
            return Err(TileMathError::ZoomOrder { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn single(zoom: u8) -> Result<Self> {
        Self::new(zoom, zoom)
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// Moves the lower bound, clamping it and dragging `max` up if crossed.
    pub fn with_min(self, zoom: u8) -> Self {
        let min = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        Self { min, max: self.max.max(min) }
    }

    /// Moves the upper bound, clamping it and dragging `min` down if crossed.
    pub fn with_max(self, zoom: u8) -> Self {
        let max = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        Self { min: self.min.min(max), max }
    }

    pub fn levels(&self) -> std::ops::RangeInclusive<u8> {
        self.min..=self.max
    }

    pub fn level_count(&self) -> usize {
        usize::from(self.max - self.min) + 1
    }
}

impl std::fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_order_and_bounds() {
        assert!(ZoomRange::new(10, 16).is_ok());
        assert!(ZoomRange::new(12, 12).is_ok());
        assert_eq!(ZoomRange::new(16, 10), Err(TileMathError::ZoomOrder { min: 16, max: 10 }));
        assert_eq!(ZoomRange::new(0, 10), Err(TileMathError::ZoomOutOfRange(0)));
        assert_eq!(ZoomRange::new(1, 22), Err(TileMathError::ZoomOutOfRange(22)));
    }

    #[test]
    fn raising_min_past_max_drags_max() {
        let z = ZoomRange::new(10, 12).unwrap().with_min(15);
        assert_eq!((z.min(), z.max()), (15, 15));
    }

    #[test]
    fn lowering_max_past_min_drags_min() {
        let z = ZoomRange::new(10, 12).unwrap().with_max(4);
        assert_eq!((z.min(), z.max()), (4, 4));
    }

    #[test]
    fn setters_clamp() {
        let z = ZoomRange::default().with_max(40).with_min(0);
        assert_eq!((z.min(), z.max()), (MIN_ZOOM, MAX_ZOOM));
    }

    #[test]
    fn levels_are_inclusive() {
        let z = ZoomRange::new(3, 5).unwrap();
        assert_eq!(z.levels().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(z.level_count(), 3);
        assert_eq!(z.to_string(), "3-5");
    }
}

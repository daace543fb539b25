//! Conversion of hit points into map or path-grid coordinates.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How a world-space hit point is rescaled for consumers.
///
/// Every mode is a linear rescale of X and Z; Y is left unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CoordinateMode {
    /// Return the point unmodified.
    #[default]
    NoChange,
    /// Divide X and Z by the terrain scale, giving heightmap coordinates.
    DivideByTerrainScale,
    /// Divide X and Z by the path-grid cell stride, giving path-node coordinates.
    DivideByPathCellStride,
}

impl CoordinateMode {
    /// Applies the conversion.
    ///
    /// A non-positive or non-finite divisor leaves the point unchanged.
    #[must_use]
    pub fn apply(self, point: Vec3, terrain_scale: f32, path_cell_stride: f32) -> Vec3 {
        let divisor = match self {
            CoordinateMode::NoChange => return point,
            CoordinateMode::DivideByTerrainScale => terrain_scale,
            CoordinateMode::DivideByPathCellStride => path_cell_stride,
        };

        if !divisor.is_finite() || divisor <= 0.0 {
            log::warn!("ignoring {self:?} conversion with divisor {divisor}");
            return point;
        }

        Vec3::new(point.x / divisor, point.y, point.z / divisor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIT: Vec3 = Vec3::new(100.0, 7.0, 250.0);

    #[test]
    fn test_no_change() {
        assert_eq!(CoordinateMode::NoChange.apply(HIT, 10.0, 4.0), HIT);
    }

    #[test]
    fn test_divide_by_terrain_scale() {
        let p = CoordinateMode::DivideByTerrainScale.apply(HIT, 10.0, 4.0);
        assert_eq!(p, Vec3::new(10.0, 7.0, 25.0));
    }

    #[test]
    fn test_divide_by_path_cell_stride() {
        let p = CoordinateMode::DivideByPathCellStride.apply(HIT, 10.0, 4.0);
        assert_eq!(p, Vec3::new(25.0, 7.0, 62.5));
    }

    #[test]
    fn test_invalid_divisor_is_ignored() {
        assert_eq!(CoordinateMode::DivideByTerrainScale.apply(HIT, 0.0, 4.0), HIT);
        assert_eq!(CoordinateMode::DivideByPathCellStride.apply(HIT, 10.0, -1.0), HIT);
        assert_eq!(CoordinateMode::DivideByTerrainScale.apply(HIT, f32::NAN, 4.0), HIT);
    }

    #[test]
    fn test_default_mode() {
        assert_eq!(CoordinateMode::default(), CoordinateMode::NoChange);
    }
}

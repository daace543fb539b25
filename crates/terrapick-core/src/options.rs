//! Configuration options for terrain picking.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::CoordinateMode;
use crate::error::Result;
use crate::intersect::DEFAULT_PARALLEL_EPSILON;

/// Tunable picking behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickOptions {
    /// Whether picking runs at all. When disabled, picks are skipped and the
    /// last result stays visible.
    pub enabled: bool,

    /// Möller–Trumbore cutoff for rays parallel to a triangle, relative to
    /// the product of the triangle's edge lengths.
    pub parallel_epsilon: f32,

    /// Whether a miss on the nearest leaf retries the second-nearest one.
    pub secondary_retry: bool,

    /// Conversion applied by [`crate::PickResult::converted_hit_point`].
    pub coordinate_mode: CoordinateMode,

    /// World units per heightmap cell.
    pub terrain_scale: f32,

    /// World units per path-grid cell.
    pub path_cell_stride: f32,

    /// Maximum triangles per leaf when building a quad-tree.
    pub leaf_triangle_budget: usize,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            parallel_epsilon: DEFAULT_PARALLEL_EPSILON,
            secondary_retry: true,
            coordinate_mode: CoordinateMode::NoChange,
            terrain_scale: 1.0,
            path_cell_stride: 1.0,
            leaf_triangle_budget: 128,
        }
    }
}

impl PickOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether picking is enabled.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the parallel-ray cutoff. Negative values are made positive and
    /// non-finite ones fall back to [`DEFAULT_PARALLEL_EPSILON`].
    #[must_use]
    pub fn with_parallel_epsilon(mut self, epsilon: f32) -> Self {
        self.parallel_epsilon = sanitize_epsilon(epsilon);
        self
    }

    /// Sets whether the second-nearest leaf is retried on a miss.
    #[must_use]
    pub fn with_secondary_retry(mut self, retry: bool) -> Self {
        self.secondary_retry = retry;
        self
    }

    /// Sets the hit-point conversion mode.
    #[must_use]
    pub fn with_coordinate_mode(mut self, mode: CoordinateMode) -> Self {
        self.coordinate_mode = mode;
        self
    }

    /// Sets the terrain scale.
    #[must_use]
    pub fn with_terrain_scale(mut self, scale: f32) -> Self {
        self.terrain_scale = scale;
        self
    }

    /// Sets the path-grid cell stride.
    #[must_use]
    pub fn with_path_cell_stride(mut self, stride: f32) -> Self {
        self.path_cell_stride = stride;
        self
    }

    /// Sets the leaf triangle budget used when building a quad-tree.
    #[must_use]
    pub fn with_leaf_triangle_budget(mut self, budget: usize) -> Self {
        self.leaf_triangle_budget = budget.max(1);
        self
    }

    /// Parses options from JSON. Missing fields take their defaults, and
    /// out-of-range values are clamped as by the `with_*` setters.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.normalized())
    }

    fn normalized(self) -> Self {
        let epsilon = self.parallel_epsilon;
        let budget = self.leaf_triangle_budget;
        let options = self
            .with_parallel_epsilon(epsilon)
            .with_leaf_triangle_budget(budget);
        if options.parallel_epsilon.to_bits() != epsilon.to_bits()
            || options.leaf_triangle_budget != budget
        {
            log::warn!(
                "adjusted pick options: parallel_epsilon {epsilon} -> {}, leaf_triangle_budget {budget} -> {}",
                options.parallel_epsilon,
                options.leaf_triangle_budget
            );
        }
        options
    }

    /// Serializes options to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        log::info!("loaded pick options from {}", path.display());
        Ok(options)
    }

    /// Saves options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

fn sanitize_epsilon(epsilon: f32) -> f32 {
    if epsilon.is_finite() {
        epsilon.abs()
    } else {
        DEFAULT_PARALLEL_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PickError;

    #[test]
    fn test_defaults() {
        let options = PickOptions::default();
        assert!(options.enabled);
        assert!(options.secondary_retry);
        assert_eq!(options.parallel_epsilon, DEFAULT_PARALLEL_EPSILON);
        assert_eq!(options.coordinate_mode, CoordinateMode::NoChange);
    }

    #[test]
    fn test_builder() {
        let options = PickOptions::new()
            .with_enabled(false)
            .with_secondary_retry(false)
            .with_parallel_epsilon(-1e-4)
            .with_coordinate_mode(CoordinateMode::DivideByTerrainScale)
            .with_terrain_scale(10.0)
            .with_path_cell_stride(2.0)
            .with_leaf_triangle_budget(0);
        assert!(!options.enabled);
        assert!(!options.secondary_retry);
        assert_eq!(options.parallel_epsilon, 1e-4);
        assert_eq!(options.terrain_scale, 10.0);
        assert_eq!(options.path_cell_stride, 2.0);
        assert_eq!(options.leaf_triangle_budget, 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options =
            PickOptions::from_json_str(r#"{ "coordinate_mode": "DivideByPathCellStride", "path_cell_stride": 8.0 }"#)
                .unwrap();
        assert_eq!(options.coordinate_mode, CoordinateMode::DivideByPathCellStride);
        assert_eq!(options.path_cell_stride, 8.0);
        assert!(options.enabled);
        assert_eq!(options.leaf_triangle_budget, 128);
    }

    #[test]
    fn test_json_out_of_range_values_are_clamped() {
        let options =
            PickOptions::from_json_str(r#"{ "parallel_epsilon": -0.5, "leaf_triangle_budget": 0 }"#)
                .unwrap();
        assert_eq!(options.parallel_epsilon, 0.5);
        assert_eq!(options.leaf_triangle_budget, 1);

        let options = PickOptions::from_json_str(r#"{ "parallel_epsilon": 2e-5 }"#).unwrap();
        assert_eq!(options.parallel_epsilon, 2e-5);
    }

    #[test]
    fn test_non_finite_epsilon_falls_back_to_default() {
        let options = PickOptions::new().with_parallel_epsilon(f32::NAN);
        assert_eq!(options.parallel_epsilon, DEFAULT_PARALLEL_EPSILON);
        let options = PickOptions::new().with_parallel_epsilon(f32::NEG_INFINITY);
        assert_eq!(options.parallel_epsilon, DEFAULT_PARALLEL_EPSILON);
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(matches!(
            PickOptions::from_json_str("{ not json"),
            Err(PickError::JsonError(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "terrapick-options-{}.json",
            std::process::id()
        ));
        let options = PickOptions::new().with_terrain_scale(4.0);
        options.save(&path).unwrap();
        let loaded = PickOptions::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            PickOptions::load("/nonexistent/terrapick/options.json"),
            Err(PickError::IoError(_))
        ));
    }
}

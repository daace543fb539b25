//! Pick results and the cache consumers read them from.

use glam::{Mat4, Vec3};

use crate::intersect::TriangleHit;
use crate::options::PickOptions;
use crate::ray::Ray;

/// Outcome of the most recent successful ray/triangle intersection.
///
/// The default value is an empty result with no hit. Positions, distance and
/// the ray are in terrain-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PickResult {
    /// Distance along `ray` to the hit, or `None` for no hit.
    pub distance: Option<f32>,

    /// Positions of the hit triangle's vertices.
    pub positions: [Vec3; 3],

    /// Vertex indices of the hit triangle.
    pub indices: [u32; 3],

    /// Key of the quad-tree leaf that owns the triangle.
    pub leaf_key: Option<u32>,

    /// The terrain-local ray that produced the hit.
    pub ray: Option<Ray>,
}

impl PickResult {
    /// Creates a result from a triangle hit in `leaf_key` along `ray`.
    #[must_use]
    pub fn from_hit(hit: &TriangleHit, leaf_key: u32, ray: Ray) -> Self {
        Self {
            distance: Some(hit.distance),
            positions: hit.positions,
            indices: hit.indices,
            leaf_key: Some(leaf_key),
            ray: Some(ray),
        }
    }

    /// Returns whether this result holds a hit.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        self.distance.is_some()
    }

    /// Returns the hit point in terrain-local space.
    #[must_use]
    pub fn hit_point(&self) -> Option<Vec3> {
        Some(self.ray?.at(self.distance?))
    }

    /// Returns the hit point mapped through the terrain world transform.
    #[must_use]
    pub fn world_hit_point(&self, transform: &Mat4) -> Option<Vec3> {
        self.hit_point().map(|p| transform.transform_point3(p))
    }

    /// Returns the world hit point rescaled by the configured coordinate mode.
    #[must_use]
    pub fn converted_hit_point(&self, transform: &Mat4, options: &PickOptions) -> Option<Vec3> {
        self.world_hit_point(transform).map(|p| {
            options
                .coordinate_mode
                .apply(p, options.terrain_scale, options.path_cell_stride)
        })
    }

    /// Returns the hit triangle's vertices in world space.
    #[must_use]
    pub fn world_positions(&self, transform: &Mat4) -> [Vec3; 3] {
        self.positions.map(|p| transform.transform_point3(p))
    }
}

/// Holds the last pick result between pick requests.
///
/// A miss never overwrites the stored result, so renderers can keep drawing
/// it on frames where picking failed or was skipped.
#[derive(Debug, Clone, Default)]
pub struct PickCache {
    result: PickResult,
    generation: u64,
    last_update_frame: Option<u64>,
}

impl PickCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored result.
    #[must_use]
    pub fn result(&self) -> &PickResult {
        &self.result
    }

    /// Returns a counter bumped on every store, for change detection.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the frame of the last store, if it was frame-driven.
    #[must_use]
    pub fn last_update_frame(&self) -> Option<u64> {
        self.last_update_frame
    }

    /// Replaces the stored result.
    pub fn store(&mut self, result: PickResult, frame: Option<u64>) {
        self.result = result;
        self.generation += 1;
        self.last_update_frame = frame;
    }

    /// Resets to an empty result, for example after a terrain reload.
    pub fn clear(&mut self) {
        self.result = PickResult::default();
        self.generation += 1;
        self.last_update_frame = None;
    }
}

/// GPU-compatible highlight triangle for renderers drawing the last pick.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HighlightVertices {
    /// Triangle corners as homogeneous points.
    pub positions: [[f32; 4]; 3],
    /// 1 when `positions` holds a hit, 0 otherwise.
    pub hit: u32,
    /// Padding for alignment.
    pub _padding: [u32; 3],
}

impl HighlightVertices {
    /// Builds the highlight from a result, placing the triangle in world space.
    #[must_use]
    pub fn from_result(result: &PickResult, transform: &Mat4) -> Self {
        if !result.is_hit() {
            return Self::default();
        }
        Self {
            positions: result
                .world_positions(transform)
                .map(|p| p.extend(1.0).to_array()),
            hit: 1,
            _padding: [0; 3],
        }
    }
}

impl From<&PickResult> for HighlightVertices {
    fn from(result: &PickResult) -> Self {
        Self::from_result(result, &Mat4::IDENTITY)
    }
}

impl Default for HighlightVertices {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

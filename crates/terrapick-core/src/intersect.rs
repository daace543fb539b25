//! Ray/triangle intersection over a leaf's index run.

use glam::Vec3;

use crate::error::{PickError, Result};
use crate::ray::Ray;

/// Default parallel cutoff.
///
/// Compared against the determinant divided by the product of the two edge
/// lengths, i.e. roughly the sine of the angle between the ray and the
/// triangle plane, so it holds for triangles of any size.
pub const DEFAULT_PARALLEL_EPSILON: f32 = 1e-6;

/// The closest triangle hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray.
    pub distance: f32,
    /// Positions of the three triangle vertices.
    pub positions: [Vec3; 3],
    /// Vertex indices of the triangle.
    pub indices: [u32; 3],
}

/// Möller–Trumbore test of a single triangle.
///
/// Returns the distance along the ray, or `None` when the ray is parallel to
/// the triangle plane, passes outside the triangle, or the triangle lies
/// behind the origin. Degenerate triangles never hit.
#[must_use]
pub fn ray_triangle_distance(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3, epsilon: f32) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let p = ray.direction().cross(edge2);
    let det = edge1.dot(p);
    // A NaN or negative epsilon still rejects an exactly zero determinant
    let cutoff = (epsilon * edge1.length() * edge2.length()).max(f32::MIN_POSITIVE);
    if det.abs() < cutoff {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin() - v0;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction().dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if t < 0.0 {
        return None;
    }
    Some(t)
}

/// Finds the closest triangle of `indices` hit by `ray`.
///
/// `indices` is read in groups of three. Ties on distance keep the triangle
/// that appears first. Indices outside `positions` abort the search with
/// [`PickError::InvalidIndex`].
pub fn intersect(
    ray: &Ray,
    positions: &[Vec3],
    indices: &[u32],
    epsilon: f32,
) -> Result<Option<TriangleHit>> {
    if indices.len() % 3 != 0 {
        return Err(PickError::MalformedIndexRun {
            len: indices.len(),
            leaf_key: None,
        });
    }

    let vertex = |index: u32| {
        positions
            .get(index as usize)
            .copied()
            .ok_or(PickError::InvalidIndex {
                index,
                vertex_count: positions.len(),
                leaf_key: None,
            })
    };

    let mut best: Option<TriangleHit> = None;
    for tri in indices.chunks_exact(3) {
        let tri = [tri[0], tri[1], tri[2]];
        let corners = [vertex(tri[0])?, vertex(tri[1])?, vertex(tri[2])?];

        let Some(t) = ray_triangle_distance(ray, corners[0], corners[1], corners[2], epsilon)
        else {
            continue;
        };

        let closer = match &best {
            Some(hit) => t < hit.distance,
            None => true,
        };
        if closer {
            best = Some(TriangleHit {
                distance: t,
                positions: corners,
                indices: tri,
            });
        }
    }

    Ok(best)
}

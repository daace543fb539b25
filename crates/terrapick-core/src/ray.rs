//! Rays and axis-aligned bounding volumes.
//!
//! Both live in the same coordinate space as the terrain vertex array. A
//! world-space cursor ray is brought into that space with
//! [`Ray::transformed`] and the terrain's inverse world transform; the
//! geometry itself is never transformed.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{PickError, Result};

/// Direction components smaller than this are treated as parallel to a slab.
const SLAB_PARALLEL_EPSILON: f32 = 1e-6;

/// A half-line with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Creates a ray, normalizing `direction`.
    ///
    /// Fails with [`PickError::DegenerateRay`] when the direction has zero
    /// length or either vector is not finite.
    pub fn new(origin: Vec3, direction: Vec3) -> Result<Self> {
        if !origin.is_finite() || !direction.is_finite() {
            return Err(PickError::DegenerateRay);
        }
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return Err(PickError::DegenerateRay);
        }
        Ok(Self { origin, direction })
    }

    /// Returns the ray origin.
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the unit direction.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Returns the point at distance `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Maps the ray through an affine transform.
    ///
    /// The direction is renormalized, so distances measured along the result
    /// are in the target space.
    pub fn transformed(&self, matrix: &Mat4) -> Result<Self> {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }
}

/// Source of the per-frame cursor ray.
///
/// Camera math is left to the host; implementors only promise a world-space
/// ray, or `None` when no ray can be formed this frame.
pub trait RayBuilder {
    /// Computes the world-space ray under the cursor.
    fn compute_cursor_ray(&self) -> Option<Ray>;
}

impl RayBuilder for Ray {
    fn compute_cursor_ray(&self) -> Option<Ray> {
        Some(*self)
    }
}

impl<T: RayBuilder + ?Sized> RayBuilder for &T {
    fn compute_cursor_ray(&self) -> Option<Ray> {
        (**self).compute_cursor_ray()
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from two corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns the smallest box containing every point, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Returns the smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns whether the point lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns the center of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the box extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Slab test: distance along `ray` to the first point inside the box.
    ///
    /// Returns `Some(0.0)` when the origin is already inside. An axis the ray
    /// runs parallel to never narrows the interval; it only rejects the ray
    /// when the origin lies outside that slab.
    #[must_use]
    pub fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        let origin = ray.origin();
        let direction = ray.direction();
        let mut t_near = 0.0_f32;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            if d.abs() < SLAB_PARALLEL_EPSILON {
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t0 = (self.min[axis] - o) * inv;
            let mut t1 = (self.max[axis] - o) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }

        Some(t_near)
    }
}

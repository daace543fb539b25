//! Core of terrapick: cursor picking against a quad-tree indexed terrain.
//!
//! This crate provides the building blocks the picking orchestrator drives:
//! - [`QuadTree`] spatial index whose leaves own contiguous triangle index runs
//! - [`select_candidates`] coarse search for the two nearest leaves along a ray
//! - [`intersect`] Möller–Trumbore search for the closest triangle in a leaf
//! - [`PickResult`] and [`PickCache`] holding the last hit for consumers
//! - [`PickOptions`] configuration and [`CoordinateMode`] hit-point conversion

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Tests build grids from integer loop counters
#![cfg_attr(test, allow(clippy::cast_precision_loss))]

pub mod candidates;
pub mod coords;
pub mod error;
pub mod intersect;
pub mod options;
pub mod pick;
pub mod quadtree;
pub mod ray;
pub mod terrain;

pub use candidates::{select, select_candidates, Candidate, ClosestTwo};
pub use coords::CoordinateMode;
pub use error::{PickError, Result};
pub use intersect::{intersect, ray_triangle_distance, TriangleHit, DEFAULT_PARALLEL_EPSILON};
pub use options::PickOptions;
pub use pick::{HighlightVertices, PickCache, PickResult};
pub use quadtree::{NodeKind, QuadNode, QuadTree};
pub use ray::{Aabb, Ray, RayBuilder};
pub use terrain::{TerrainGeometry, TerrainVertex};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};

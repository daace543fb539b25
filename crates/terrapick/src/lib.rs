//! terrapick: per-frame cursor picking against large quad-tree terrains.
//!
//! Given a cursor ray, terrapick finds the terrain triangle under it in two
//! phases: a descent of the terrain's quad-tree keeps the two leaves whose
//! bounds the ray reaches first, then the triangles of the nearest leaf are
//! intersected, falling back to the second leaf on a miss.
//!
//! # Quick Start
//!
//! ```
//! use terrapick::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let vertices = vec![
//!         TerrainVertex::new(Vec3::new(0.0, 0.0, 0.0)),
//!         TerrainVertex::new(Vec3::new(0.0, 0.0, 10.0)),
//!         TerrainVertex::new(Vec3::new(10.0, 0.0, 0.0)),
//!     ];
//!     let (terrain, mut picker) = load_terrain(vertices, &[0, 1, 2], PickOptions::default())?;
//!
//!     let mut camera = Camera::default();
//!     camera.look_at_bounds(terrain.tree().bounds());
//!     let mut rig = CursorCamera::new(camera, Viewport::new(1280, 720));
//!     rig.cursor.set_position(Vec2::new(600.0, 380.0), rig.viewport);
//!
//!     for frame in 0..3 {
//!         picker.pick_frame(frame, &terrain, &rig)?;
//!         if let Some(point) = picker.last_result().world_hit_point(terrain.transform()) {
//!             println!("cursor over {point}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! - `terrapick-core`: spatial index, candidate selection, intersection, results
//! - `terrapick-camera`: camera and cursor ray construction

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod init;
mod picker;

pub use init::{init_logging, load_terrain};
pub use picker::{Attempt, MissReason, PickOutcome, PickState, PickStats, Picker};

// Re-export core types
pub use terrapick_core::{
    candidates::{select, select_candidates, Candidate, ClosestTwo},
    coords::CoordinateMode,
    error::{PickError, Result},
    intersect::{intersect, ray_triangle_distance, TriangleHit},
    options::PickOptions,
    pick::{HighlightVertices, PickCache, PickResult},
    quadtree::{NodeKind, QuadNode, QuadTree},
    ray::{Aabb, Ray, RayBuilder},
    terrain::{TerrainGeometry, TerrainVertex},
    Mat4, Vec2, Vec3, Vec4,
};

// Re-export camera types
pub use terrapick_camera::{cursor_ray, Camera, CursorCamera, CursorState, ProjectionMode, Viewport};

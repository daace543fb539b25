//! Cursor ray construction for terrapick.
//!
//! This crate turns a pointer or stick-driven cursor plus camera state into
//! the world-space [`terrapick_core::Ray`] the picker consumes:
//! - [`Camera`] view and projection
//! - [`CursorState`] pointer position clamped to a [`Viewport`]
//! - [`cursor_ray`] unprojection and the [`CursorCamera`] ray builder

pub mod camera;
pub mod cursor;

pub use camera::{Camera, ProjectionMode};
pub use cursor::{cursor_ray, CursorCamera, CursorState, Viewport};

//! Cursor state and screen-to-world ray construction.

use glam::{Vec2, Vec4};
use terrapick_core::{Ray, RayBuilder};

use crate::camera::Camera;

/// Size of the render target in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true when either dimension is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the size as floats.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Returns width / height, or 1 for an empty viewport.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            let size = self.size();
            size.x / size.y
        }
    }

    /// Returns the center pixel.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }
}

/// Pointer position in pixels, origin top-left, Y down.
///
/// Can be driven directly by a mouse or incrementally by an analog stick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorState {
    position: Vec2,
}

impl CursorState {
    /// Creates a cursor at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self { position }
    }

    /// Returns the pointer position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the pointer, clamped to the viewport.
    pub fn set_position(&mut self, position: Vec2, viewport: Viewport) {
        self.position = position.clamp(Vec2::ZERO, viewport.size());
    }

    /// Moves the pointer by a stick deflection.
    ///
    /// `stick` is in [-1, 1] per axis with +Y up; `speed` is pixels per
    /// second at full deflection.
    pub fn apply_stick(&mut self, stick: Vec2, speed: f32, dt: f32, viewport: Viewport) {
        let stick = stick.clamp(Vec2::NEG_ONE, Vec2::ONE);
        let delta = Vec2::new(stick.x, -stick.y) * speed * dt;
        self.set_position(self.position + delta, viewport);
    }
}

/// Unprojects a pixel into a world-space ray.
///
/// Uses wgpu-style NDC depth [0, 1]. Returns `None` for an empty viewport
/// or a projection that cannot be inverted at this pixel.
#[must_use]
pub fn cursor_ray(cursor: Vec2, viewport: Viewport, camera: &Camera) -> Option<Ray> {
    if viewport.is_empty() {
        return None;
    }

    let half = viewport.center();
    let ndc_x = (cursor.x / half.x) - 1.0;
    let ndc_y = 1.0 - (cursor.y / half.y);

    let inv_view_proj = camera.view_projection_matrix().inverse();

    let near = inv_view_proj * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
    let far = inv_view_proj * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

    if near.w.abs() < 1e-6 || far.w.abs() < 1e-6 {
        log::trace!("cursor {cursor} does not unproject");
        return None;
    }

    let ray_origin = near.truncate() / near.w;
    let ray_far = far.truncate() / far.w;
    Ray::new(ray_origin, ray_far - ray_origin).ok()
}

/// A camera, cursor and viewport bundled as a [`RayBuilder`].
#[derive(Debug, Clone, Default)]
pub struct CursorCamera {
    /// The viewing camera.
    pub camera: Camera,
    /// The pointer.
    pub cursor: CursorState,
    /// The render target size.
    pub viewport: Viewport,
}

impl CursorCamera {
    /// Creates a cursor camera with the cursor centered in the viewport.
    #[must_use]
    pub fn new(mut camera: Camera, viewport: Viewport) -> Self {
        camera.set_aspect_ratio(viewport.aspect_ratio());
        Self {
            camera,
            cursor: CursorState::new(viewport.center()),
            viewport,
        }
    }

    /// Resizes the viewport, keeping the cursor inside it.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.set_aspect_ratio(viewport.aspect_ratio());
        self.cursor.set_position(self.cursor.position(), viewport);
    }
}

impl RayBuilder for CursorCamera {
    fn compute_cursor_ray(&self) -> Option<Ray> {
        cursor_ray(self.cursor.position(), self.viewport, &self.camera)
    }
}

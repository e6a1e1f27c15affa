//! Pointer projection from NDC onto the world-space plane the bodies live in.

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::input::PointerState;

/// Scale NDC by half the visible world extent.
///
/// A zero or non-finite extent or pointer yields the zero vector.
#[inline]
pub fn project_ndc(ndc: Vec2, extent: Vec2) -> Vec3 {
    if !ndc.is_finite() || !extent.is_finite() || extent.x == 0.0 || extent.y == 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(ndc.x * extent.x * 0.5, ndc.y * extent.y * 0.5, 0.0)
}

/// Converts pointer samples to world positions using the scene camera.
#[derive(Clone, Debug)]
pub struct PointerProjector {
    camera: Camera,
}

impl PointerProjector {
    pub fn new(camera: Camera) -> Self {
        Self { camera }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// World-space pointer position on the `z = 0` plane.
    pub fn project(&self, pointer: &PointerState) -> Vec3 {
        project_ndc(pointer.ndc, self.camera.visible_extent(pointer.viewport_size))
    }
}

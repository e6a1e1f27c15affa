//! Perspective camera looking at the backdrop plane.

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;

/// Fixed perspective camera.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Point the camera looks at; the pointer plane passes through it.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: config.position,
            target: config.target,
            fov_degrees: config.fov_degrees,
            near: config.near,
            far: config.far,
        }
    }

    /// Distance from the camera to its target.
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// World-space width and height visible at the target distance.
    ///
    /// Returns zero when the viewport has a zero or non-finite dimension.
    pub fn visible_extent(&self, viewport_size: Vec2) -> Vec2 {
        if !(viewport_size.is_finite() && viewport_size.x > 0.0 && viewport_size.y > 0.0) {
            return Vec2::ZERO;
        }
        let aspect = viewport_size.x / viewport_size.y;
        let height = 2.0 * (self.fov_degrees.to_radians() * 0.5).tan() * self.distance();
        Vec2::new(height * aspect, height)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

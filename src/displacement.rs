//! The pointer-reactive displaced sphere.
//!
//! The vertex displacement itself runs on the GPU (`shaders/displacement.wgsl`).
//! [`displace`] is the same formula on the CPU, used by tests and benches to
//! pin the constants down.

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use crate::config::{DisplacementConfig, Rgb};
use crate::smoothing::{smoothstep, SmoothingMode};
use crate::uniforms::{names, UniformSink, UniformValue};

/// Frequency of the sin/cos wobble over object-space XY.
pub const WAVE_FREQUENCY: f32 = 2.0;
/// Peak amplitude of the wobble.
pub const WAVE_AMPLITUDE: f32 = 0.15;
/// Object-space XY is scaled by this before comparing against pointer NDC.
pub const POINTER_SPACE_SCALE: f32 = 0.2;
/// Radius over which the pointer bulge fades to nothing.
pub const BULGE_RADIUS: f32 = 1.5;
pub const BULGE_AMPLITUDE: f32 = 0.2;
pub const BASE_INTENSITY: f32 = 0.3;
pub const INTENSITY_GAIN: f32 = 2.5;

/// Values the displacement shader reads every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplacementUniforms {
    /// Seconds since the scene started.
    pub time: f32,
    pub pointer_ndc: Vec2,
    pub base_color: Rgb,
}

/// Result of displacing one vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplacedVertex {
    pub position: Vec3,
    pub distortion: f32,
    /// Brightness multiplier applied to the base color.
    pub intensity: f32,
}

/// Scalar offset along the normal for an object-space vertex.
#[inline]
pub fn distortion(position: Vec3, time: f32, pointer_ndc: Vec2) -> f32 {
    let wave = (position.x * WAVE_FREQUENCY + time).sin()
        * (position.y * WAVE_FREQUENCY + time).cos()
        * WAVE_AMPLITUDE;
    let d = pointer_ndc.distance(position.truncate() * POINTER_SPACE_SCALE);
    wave + (1.0 - smoothstep(0.0, BULGE_RADIUS, d)) * BULGE_AMPLITUDE
}

/// CPU reference for the vertex stage of the displacement shader.
pub fn displace(position: Vec3, normal: Vec3, time: f32, pointer_ndc: Vec2) -> DisplacedVertex {
    let distortion = distortion(position, time, pointer_ndc);
    DisplacedVertex {
        position: position + normal * distortion,
        distortion,
        intensity: BASE_INTENSITY + distortion * INTENSITY_GAIN,
    }
}

/// Owns the sphere's uniforms and its whole-mesh rotation and scale.
#[derive(Clone, Debug)]
pub struct DisplacementUnit {
    uniforms: DisplacementUniforms,
    rotation_rate: Vec2,
    pulse: f32,
    scale_smoothing: f32,
    mode: SmoothingMode,
    rotation: Vec2,
    scale: f32,
}

impl DisplacementUnit {
    pub fn new(config: &DisplacementConfig, mode: SmoothingMode) -> Self {
        Self {
            uniforms: DisplacementUniforms {
                time: 0.0,
                pointer_ndc: Vec2::ZERO,
                base_color: config.color,
            },
            rotation_rate: config.rotation_rate,
            pulse: config.pulse,
            scale_smoothing: config.scale_smoothing,
            mode,
            rotation: Vec2::ZERO,
            scale: 1.0,
        }
    }

    /// Refresh uniforms, rotation and the smoothed scale for this frame.
    pub fn update(&mut self, elapsed: f32, dt: f32, pointer_ndc: Vec2) {
        self.uniforms.time = elapsed;
        self.uniforms.pointer_ndc = pointer_ndc;
        self.rotation = self.rotation_rate * elapsed;

        let target = 1.0 + (pointer_ndc.x * pointer_ndc.y).abs() * self.pulse;
        let factor = self.mode.factor(self.scale_smoothing, dt);
        self.scale += (target - self.scale) * factor;
    }

    /// Push this frame's values to `sink`.
    pub fn apply<S: UniformSink + ?Sized>(&self, sink: &mut S) {
        sink.set_uniform(names::TIME, UniformValue::F32(self.uniforms.time));
        sink.set_uniform(names::POINTER, UniformValue::Vec2(self.uniforms.pointer_ndc));
        sink.set_uniform(names::SPHERE_COLOR, UniformValue::Vec3(self.uniforms.base_color.to_vec3()));
        sink.set_uniform(names::SPHERE_MODEL, UniformValue::Mat4(self.model_matrix()));
    }

    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0);
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, Vec3::ZERO)
    }

    pub fn uniforms(&self) -> &DisplacementUniforms {
        &self.uniforms
    }

    /// Euler angles `(x, y)` in radians.
    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }
}

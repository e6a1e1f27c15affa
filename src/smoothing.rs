//! Interpolation helpers and frame-rate aware smoothing.
//!
//! Every smoothed quantity in the scene (body positions, sphere scale, cloud
//! rotation) is an exponential-decay filter: each frame the value moves a
//! fraction `f` of the way to its target. The fractions are tuned for a
//! 60 Hz host. [`SmoothingMode::FrameRateIndependent`] rescales them by the
//! actual frame delta so that `1 - (1 - f)^(dt * hz)` is used instead, which
//! equals `f` exactly when `dt == 1 / hz`.

use serde::{Deserialize, Serialize};

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic Hermite step between `edge0` and `edge1`, clamped to `[0, 1]`.
///
/// Same semantics as the WGSL/GLSL builtin.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// How per-frame smoothing factors react to the real frame delta.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SmoothingMode {
    /// Use the factor as-is every frame, whatever the frame delta.
    Fixed,
    /// Rescale the factor so convergence speed is independent of frame rate.
    FrameRateIndependent {
        /// Frame rate the per-frame factors were tuned for.
        reference_hz: f32,
    },
}

impl Default for SmoothingMode {
    fn default() -> Self {
        SmoothingMode::FrameRateIndependent { reference_hz: 60.0 }
    }
}

impl SmoothingMode {
    /// Blend factor to use this frame for a per-frame `factor`.
    ///
    /// A stalled clock (`dt <= 0`) yields `0.0` in frame-rate independent mode.
    pub fn factor(&self, factor: f32, dt: f32) -> f32 {
        match *self {
            SmoothingMode::Fixed => factor,
            SmoothingMode::FrameRateIndependent { reference_hz } => {
                if dt <= 0.0 {
                    return 0.0;
                }
                let frames = dt * reference_hz;
                1.0 - (1.0 - factor.clamp(0.0, 1.0)).powf(frames)
            }
        }
    }

    /// Amount to add this frame for a constant per-frame `increment`.
    pub fn increment(&self, increment: f32, dt: f32) -> f32 {
        match *self {
            SmoothingMode::Fixed => increment,
            SmoothingMode::FrameRateIndependent { reference_hz } => {
                if dt <= 0.0 {
                    0.0
                } else {
                    increment * dt * reference_hz
                }
            }
        }
    }
}

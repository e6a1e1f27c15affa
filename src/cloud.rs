//! Static background point cloud that leans toward the pointer.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::CloudConfig;
use crate::smoothing::SmoothingMode;

/// One cloud point, as uploaded to the vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CloudPoint {
    pub position: [f32; 3],
}

/// Points are fixed at construction; only the cloud's rotation changes.
#[derive(Clone, Debug)]
pub struct BackgroundCloud {
    points: Vec<CloudPoint>,
    /// Euler angles `(x, y)` in radians.
    rotation: Vec2,
    drift: f32,
    smoothing: f32,
    auto_rotation: f32,
    mode: SmoothingMode,
}

impl BackgroundCloud {
    pub fn new(config: &CloudConfig, mode: SmoothingMode) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, mode, &mut rng)
    }

    pub fn with_rng<R: Rng>(config: &CloudConfig, mode: SmoothingMode, rng: &mut R) -> Self {
        let extent = config.extent;
        let points = (0..config.count)
            .map(|_| CloudPoint {
                position: [
                    (rng.gen::<f32>() - 0.5) * extent.x,
                    (rng.gen::<f32>() - 0.5) * extent.y,
                    (rng.gen::<f32>() - 0.5) * extent.z,
                ],
            })
            .collect();
        Self {
            points,
            rotation: Vec2::ZERO,
            drift: config.drift,
            smoothing: config.smoothing,
            auto_rotation: config.auto_rotation,
            mode,
        }
    }

    /// Spin about y, then ease the tilt toward the pointer direction.
    pub fn update(&mut self, pointer_ndc: Vec2, dt: f32) {
        self.rotation.y += self.mode.increment(self.auto_rotation, dt);
        let factor = self.mode.factor(self.smoothing, dt);
        let target = Vec2::new(-pointer_ndc.y, pointer_ndc.x) * self.drift;
        self.rotation.y += (target.y - self.rotation.y) * factor;
        self.rotation.x += (target.x - self.rotation.x) * factor;
    }

    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_quat(Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0))
    }

    pub fn points(&self) -> &[CloudPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

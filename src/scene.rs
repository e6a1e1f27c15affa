//! Scene assembly and the per-frame tick.
//!
//! One [`SceneComposer::tick`] runs, in order:
//!
//! 1. pointer projection to world space
//! 2. body field step
//! 3. instance writes followed by a single flush
//! 4. displacement uniforms and sphere transform
//! 5. point light follow
//! 6. cloud rotation and camera matrix
//!
//! All of it is synchronous and writes only through the [`SceneBackend`].

use glam::{Vec2, Vec3};

use crate::backend::SceneBackend;
use crate::camera::Camera;
use crate::cloud::BackgroundCloud;
use crate::config::SceneConfig;
use crate::displacement::DisplacementUnit;
use crate::error::ConfigError;
use crate::field::ParticleField;
use crate::input::PointerState;
use crate::instances::InstanceWriter;
use crate::light::LightRig;
use crate::pointer::PointerProjector;
use crate::uniforms::{names, UniformValue};

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub elapsed: f32,
    pub dt: f32,
    pub pointer_world: Vec3,
    /// Instance slots written before the flush.
    pub instances_written: u32,
}

/// Owns every animated part of the backdrop.
#[derive(Clone, Debug)]
pub struct SceneComposer {
    projector: PointerProjector,
    field: ParticleField,
    writer: InstanceWriter,
    displacement: DisplacementUnit,
    lights: LightRig,
    cloud: BackgroundCloud,
}

impl SceneComposer {
    /// Validate `config` and build the scene from it.
    pub fn new(config: &SceneConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = ParticleField::new(&config.field, config.smoothing);
        Ok(Self::assemble(config, field))
    }

    /// Build the scene around an existing body field.
    pub fn with_field(config: &SceneConfig, field: ParticleField) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, field))
    }

    fn assemble(config: &SceneConfig, field: ParticleField) -> Self {
        let mode = config.smoothing;
        log::info!(
            "scene: {} bodies, sphere detail {}, {} cloud points, {:?} smoothing",
            field.len(),
            config.displacement.detail,
            config.cloud.count,
            mode
        );
        Self {
            projector: PointerProjector::new(Camera::new(&config.camera)),
            writer: InstanceWriter::new(field.len() as u32),
            field,
            displacement: DisplacementUnit::new(&config.displacement, mode),
            lights: LightRig::new(&config.light),
            cloud: BackgroundCloud::new(&config.cloud, mode),
        }
    }

    /// Advance the scene by one frame and push the results to `backend`.
    pub fn tick<B: SceneBackend + ?Sized>(
        &mut self,
        elapsed: f32,
        dt: f32,
        pointer: PointerState,
        backend: &mut B,
    ) -> FrameReport {
        let pointer_world = self.projector.project(&pointer);

        self.field.step(elapsed, dt, pointer_world);
        self.writer.write_field(backend, &self.field, elapsed);
        let instances_written = self.writer.flush(backend);

        self.displacement.update(elapsed, dt, pointer.ndc);
        self.displacement.apply(backend);

        self.lights.follow(pointer_world, backend);

        self.cloud.update(pointer.ndc, dt);
        backend.set_uniform(names::CLOUD_MODEL, UniformValue::Mat4(self.cloud.model_matrix()));

        if let Some(aspect) = aspect_ratio(pointer.viewport_size) {
            let view_proj = self.projector.camera().view_projection(aspect);
            backend.set_uniform(names::VIEW_PROJ, UniformValue::Mat4(view_proj));
        }

        FrameReport {
            elapsed,
            dt,
            pointer_world,
            instances_written,
        }
    }

    pub fn camera(&self) -> &Camera {
        self.projector.camera()
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn writer(&self) -> &InstanceWriter {
        &self.writer
    }

    pub fn displacement(&self) -> &DisplacementUnit {
        &self.displacement
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn cloud(&self) -> &BackgroundCloud {
        &self.cloud
    }
}

/// `None` while the viewport is degenerate (e.g. a minimized window).
fn aspect_ratio(viewport_size: Vec2) -> Option<f32> {
    (viewport_size.is_finite() && viewport_size.x > 0.0 && viewport_size.y > 0.0)
        .then(|| viewport_size.x / viewport_size.y)
}

//! # driftfield
//!
//! A pointer-reactive animated backdrop: a field of translucent bodies that
//! orbit their home points and get pushed away from the pointer, a wireframe
//! sphere whose vertices wobble and bulge toward the pointer, and a faint
//! point cloud that leans with it.
//!
//! ## Quick Start
//!
//! Everything except [`gpu`] runs without a GPU. A headless run:
//!
//! ```ignore
//! use driftfield::prelude::*;
//!
//! let mut config = SceneConfig::default();
//! config.field.seed = Some(7);
//!
//! let scene = SceneComposer::new(&config)?;
//! let mut backend = HeadlessBackend::new(scene.field().len() as u32);
//! let mut render_loop = RenderLoop::start(scene, ManualClock::at_hz(60.0));
//!
//! let pointer = PointerState::new(Vec2::new(0.3, -0.2), Vec2::new(1280.0, 720.0));
//! render_loop.run_frames(100, &pointer, &pointer, &mut backend);
//! render_loop.teardown();
//! ```
//!
//! ## Frame model
//!
//! One [`RenderLoop::run_frame`] call is one frame. It samples the
//! [`FrameClock`], the latest pointer and the viewport size, then
//! [`SceneComposer::tick`] projects the pointer into world space, steps the
//! [`ParticleField`], writes every body transform (inside the field's
//! [`FloatMotion`] group) and flushes the instance buffer once, updates the displaced sphere, moves the point light and
//! rotates the cloud. All output goes through three sinks ([`InstanceSink`],
//! [`UniformSink`], [`LightSink`]); the windowed host implements them on the
//! wgpu renderer, tests use [`HeadlessBackend`].
//!
//! ## Smoothing
//!
//! Every eased quantity uses a per-frame blend factor tuned for 60 Hz
//! (0.03 for bodies, 0.1 for sphere scale, 0.05 for the cloud). By default
//! the factors are rescaled by the real frame delta; set
//! [`SmoothingMode::Fixed`] to apply them verbatim every frame.

pub mod backend;
pub mod camera;
pub mod cloud;
pub mod config;
pub mod displacement;
pub mod error;
pub mod field;
pub mod gpu;
pub mod input;
pub mod instances;
pub mod light;
pub mod mesh;
pub mod pointer;
pub mod render_loop;
pub mod scene;
pub mod shaders;
pub mod smoothing;
pub mod time;
pub mod uniforms;

pub use backend::{HeadlessBackend, SceneBackend};
pub use camera::Camera;
pub use cloud::BackgroundCloud;
pub use config::{SceneConfig, ACCENT};
pub use displacement::{displace, DisplacementUnit, DisplacementUniforms};
pub use error::{AppError, ConfigError, GpuError};
pub use field::{AnimatedBody, FloatMotion, ParticleField, Repulsion};
pub use glam::{Vec2, Vec3};
pub use input::{PointerSource, PointerState, PointerTracker, ViewportSource};
pub use instances::{InstanceBuffer, InstanceSink, InstanceTransform, InstanceWriter};
pub use light::{LightRig, LightSink};
pub use pointer::PointerProjector;
pub use render_loop::{FrameOutcome, LoopHandle, RenderLoop};
pub use scene::{FrameReport, SceneComposer};
pub use smoothing::SmoothingMode;
pub use time::{FrameClock, ManualClock, Time};
pub use uniforms::{UniformBlock, UniformSink, UniformValue};

/// Convenient re-exports for headless and windowed hosts.
///
/// ```ignore
/// use driftfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backend::{HeadlessBackend, SceneBackend};
    pub use crate::config::SceneConfig;
    pub use crate::input::{PointerState, PointerTracker};
    pub use crate::render_loop::{FrameOutcome, LoopHandle, RenderLoop};
    pub use crate::scene::SceneComposer;
    pub use crate::smoothing::SmoothingMode;
    pub use crate::time::{FrameClock, ManualClock, Time};
    pub use glam::{Vec2, Vec3};
}

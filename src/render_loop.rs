//! Frame driver with explicit cancellation.
//!
//! The host calls [`RenderLoop::run_frame`] once per redraw. Every call first
//! checks the loop's active flag; after [`LoopHandle::cancel`] (or
//! [`RenderLoop::teardown`], or dropping the loop) a frame touches nothing and
//! returns [`FrameOutcome::Stopped`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::backend::SceneBackend;
use crate::input::{PointerSource, ViewportSource};
use crate::scene::{FrameReport, SceneComposer};
use crate::time::FrameClock;

/// Shared "still active" flag for one render loop.
#[derive(Clone, Debug)]
pub struct LoopHandle {
    active: Arc<AtomicBool>,
}

impl LoopHandle {
    fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deregister the loop. Returns `true` only for the call that stopped it.
    pub fn cancel(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

/// Result of one [`RenderLoop::run_frame`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameOutcome {
    Rendered(FrameReport),
    Stopped,
}

impl FrameOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, FrameOutcome::Rendered(_))
    }
}

/// Drives a [`SceneComposer`] from a [`FrameClock`].
pub struct RenderLoop<C: FrameClock> {
    scene: SceneComposer,
    clock: C,
    handle: LoopHandle,
    frames: u64,
}

impl<C: FrameClock> RenderLoop<C> {
    /// Register a new active loop.
    pub fn start(scene: SceneComposer, clock: C) -> Self {
        log::debug!("render loop started");
        Self {
            scene,
            clock,
            handle: LoopHandle::new(),
            frames: 0,
        }
    }

    /// A handle that can cancel the loop from elsewhere.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// Run one frame with the latest pointer and viewport samples.
    pub fn run_frame<P, V, B>(&mut self, pointer: &P, viewport: &V, backend: &mut B) -> FrameOutcome
    where
        P: PointerSource + ?Sized,
        V: ViewportSource + ?Sized,
        B: SceneBackend + ?Sized,
    {
        if !self.handle.is_active() {
            return FrameOutcome::Stopped;
        }
        let (elapsed, dt) = self.clock.advance();
        let mut state = pointer.sample();
        state.viewport_size = viewport.size();
        let report = self.scene.tick(elapsed, dt, state, backend);
        self.frames += 1;
        FrameOutcome::Rendered(report)
    }

    /// Run up to `count` frames, stopping early once cancelled.
    pub fn run_frames<P, V, B>(&mut self, count: usize, pointer: &P, viewport: &V, backend: &mut B) -> usize
    where
        P: PointerSource + ?Sized,
        V: ViewportSource + ?Sized,
        B: SceneBackend + ?Sized,
    {
        let mut rendered = 0;
        while rendered < count && self.run_frame(pointer, viewport, backend).is_rendered() {
            rendered += 1;
        }
        rendered
    }

    /// Stop the loop. Returns `true` if this call deregistered it.
    pub fn teardown(&mut self) -> bool {
        let stopped = self.handle.cancel();
        if stopped {
            log::debug!("render loop stopped after {} frames", self.frames);
        }
        stopped
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scene(&self) -> &SceneComposer {
        &self.scene
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}

impl<C: FrameClock> Drop for RenderLoop<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::config::SceneConfig;
    use crate::input::PointerState;
    use crate::time::ManualClock;
    use glam::Vec2;

    fn new_loop() -> RenderLoop<ManualClock> {
        let mut config = SceneConfig::default();
        config.field.seed = Some(4);
        config.cloud.seed = Some(5);
        config.cloud.count = 16;
        let scene = SceneComposer::new(&config).unwrap();
        RenderLoop::start(scene, ManualClock::at_hz(60.0))
    }

    #[test]
    fn cancel_succeeds_exactly_once() {
        let render_loop = new_loop();
        let handle = render_loop.handle();
        assert!(handle.is_active());
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(!render_loop.is_active());
    }

    #[test]
    fn frames_stop_after_cancel() {
        let mut render_loop = new_loop();
        let pointer = PointerState::new(Vec2::ZERO, Vec2::new(640.0, 480.0));
        let mut backend = HeadlessBackend::new(40);

        assert_eq!(render_loop.run_frames(3, &pointer, &pointer, &mut backend), 3);
        assert!(render_loop.teardown());
        assert!(!render_loop.teardown());

        let writes = backend.total_writes();
        assert_eq!(render_loop.run_frame(&pointer, &pointer, &mut backend), FrameOutcome::Stopped);
        assert_eq!(backend.total_writes(), writes);
        assert_eq!(render_loop.frames(), 3);
        assert_eq!(render_loop.clock().frame(), 3);
    }

    #[test]
    fn viewport_source_overrides_pointer_size() {
        let mut render_loop = new_loop();
        let pointer = PointerState::new(Vec2::new(1.0, 0.0), Vec2::new(640.0, 480.0));
        let mut backend = HeadlessBackend::new(40);
        let outcome = render_loop.run_frame(&pointer, &Vec2::ZERO, &mut backend);
        match outcome {
            FrameOutcome::Rendered(report) => assert_eq!(report.pointer_world, glam::Vec3::ZERO),
            FrameOutcome::Stopped => panic!("loop should be active"),
        }
    }

    #[test]
    fn drop_deregisters() {
        let render_loop = new_loop();
        let handle = render_loop.handle();
        drop(render_loop);
        assert!(!handle.is_active());
        assert!(!handle.cancel());
    }
}

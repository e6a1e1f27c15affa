//! Frame clocks.
//!
//! The scene reads time exactly once per tick through [`FrameClock`]. The
//! windowed host uses the wall-clock [`Time`]; headless runs and tests use
//! [`ManualClock`], which advances by a fixed step.
//!
//! ```ignore
//! use driftfield::time::{FrameClock, Time};
//!
//! let mut time = Time::new();
//! let (elapsed, delta) = time.advance();
//! ```

use std::time::{Duration, Instant};

/// Source of elapsed time for the render loop.
pub trait FrameClock {
    /// Move to the next frame and return `(elapsed_seconds, delta_seconds)`.
    fn advance(&mut self) -> (f32, f32);

    /// Elapsed seconds as of the last [`advance`](FrameClock::advance).
    fn elapsed_seconds(&self) -> f32;
}

/// Wall-clock timing with pause and time scaling.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    paused: bool,
    /// Total time spent paused, excluded from `elapsed`.
    pause_elapsed: Duration,
    fixed_delta: Option<f32>,
    time_scale: f32,
    /// Exponential moving average of the unscaled frame rate.
    fps: f32,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            pause_elapsed: Duration::ZERO,
            fixed_delta: None,
            time_scale: 1.0,
            fps: 0.0,
        }
    }

    /// Update timing values. Call once per frame.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        if raw_delta > 0.0 {
            let instant_fps = 1.0 / raw_delta;
            self.fps = if self.fps == 0.0 {
                instant_fps
            } else {
                self.fps * 0.9 + instant_fps * 0.1
            };
        }
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta) * self.time_scale;
        self.last_frame = now;

        let raw_elapsed = now.duration_since(self.start).saturating_sub(self.pause_elapsed);
        self.elapsed_secs = raw_elapsed.as_secs_f32() * self.time_scale;
        self.frame_count += 1;

        (self.elapsed_secs, self.delta_secs)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Smoothed frames per second; 0 until the first update.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// While paused, `delta()` is 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    /// Use a fixed delta instead of the measured one; `None` restores real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Negative scales clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for Time {
    fn advance(&mut self) -> (f32, f32) {
        self.update()
    }

    fn elapsed_seconds(&self) -> f32 {
        self.elapsed_secs
    }
}

/// Deterministic clock advancing by a constant step per frame.
#[derive(Clone, Debug)]
pub struct ManualClock {
    step: f32,
    frame: u64,
    elapsed: f32,
}

impl ManualClock {
    pub fn new(step: f32) -> Self {
        Self {
            step: step.max(0.0),
            frame: 0,
            elapsed: 0.0,
        }
    }

    /// A clock ticking at `hz` frames per second.
    pub fn at_hz(hz: f32) -> Self {
        Self::new(1.0 / hz)
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl FrameClock for ManualClock {
    fn advance(&mut self) -> (f32, f32) {
        self.frame += 1;
        // Derived from the frame count so long runs do not accumulate drift.
        self.elapsed = self.frame as f32 * self.step;
        (self.elapsed, self.step)
    }

    fn elapsed_seconds(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn time_update_advances() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = time.advance();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(time.frame(), 1);
        assert_eq!(time.elapsed_seconds(), elapsed);
    }

    #[test]
    fn time_pause_freezes_elapsed() {
        let mut time = Time::new();
        time.update();

        time.pause();
        assert!(time.is_paused());

        let elapsed_before = time.elapsed();
        thread::sleep(Duration::from_millis(10));
        time.update();

        assert_eq!(time.elapsed(), elapsed_before);
        assert_eq!(time.delta(), 0.0);
    }

    #[test]
    fn fps_estimate_follows_frame_time() {
        let mut time = Time::new();
        assert_eq!(time.fps(), 0.0);
        thread::sleep(Duration::from_millis(10));
        time.update();
        assert!(time.fps() > 0.0 && time.fps() <= 100.0);
    }

    #[test]
    fn negative_time_scale_clamps() {
        let mut time = Time::new();
        time.set_time_scale(-1.0);
        assert_eq!(time.time_scale(), 0.0);
    }

    #[test]
    fn fixed_delta_overrides_measurement() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(1.0 / 60.0));
        thread::sleep(Duration::from_millis(20));
        time.update();
        assert!((time.delta() - 1.0 / 60.0).abs() < 0.0001);
    }

    #[test]
    fn manual_clock_is_monotonic_and_exact() {
        let mut clock = ManualClock::at_hz(60.0);
        let mut last = 0.0;
        for _ in 0..120 {
            let (elapsed, delta) = clock.advance();
            assert!(elapsed > last);
            assert!((delta - 1.0 / 60.0).abs() < 1e-7);
            last = elapsed;
        }
        assert_eq!(clock.frame(), 120);
        assert!((clock.elapsed_seconds() - 2.0).abs() < 1e-5);
    }
}

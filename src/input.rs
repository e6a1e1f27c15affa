//! Pointer and viewport input.
//!
//! The host forwards window events to a [`PointerTracker`]; the scene samples
//! it once per frame through [`PointerSource`] and [`ViewportSource`]. Only
//! the latest cursor position survives between frames, and the last known
//! position persists after the cursor leaves the window.

use glam::Vec2;
use winit::event::WindowEvent;

/// Pointer position in normalized device coordinates plus the viewport size
/// in pixels it was measured against.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerState {
    /// `[-1, 1]` on each axis, origin at the viewport center, y up.
    pub ndc: Vec2,
    pub viewport_size: Vec2,
}

impl PointerState {
    pub fn new(ndc: Vec2, viewport_size: Vec2) -> Self {
        Self { ndc, viewport_size }
    }
}

/// Latest pointer sample, never blocks.
pub trait PointerSource {
    fn sample(&self) -> PointerState;
}

/// Current viewport size in pixels.
pub trait ViewportSource {
    fn size(&self) -> Vec2;
}

impl PointerSource for PointerState {
    fn sample(&self) -> PointerState {
        *self
    }
}

impl ViewportSource for PointerState {
    fn size(&self) -> Vec2 {
        self.viewport_size
    }
}

impl ViewportSource for Vec2 {
    fn size(&self) -> Vec2 {
        *self
    }
}

/// Tracks the cursor from winit window events.
#[derive(Debug, Default)]
pub struct PointerTracker {
    ndc: Vec2,
    position_px: Vec2,
    window_size: (u32, u32),
    inside: bool,
}

impl PointerTracker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            window_size: (width, height),
            ..Default::default()
        }
    }

    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    /// Cursor position in window pixels, origin top-left.
    pub fn position(&self) -> Vec2 {
        self.position_px
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Update the size used for NDC conversion.
    ///
    /// The stored NDC is kept as-is; it refreshes on the next cursor move.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    /// Record a cursor position in window pixels.
    pub fn set_cursor_position(&mut self, x: f64, y: f64) {
        self.position_px = Vec2::new(x as f32, y as f32);
        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            let ndc = Vec2::new(
                (x as f32 / w as f32) * 2.0 - 1.0,
                1.0 - (y as f32 / h as f32) * 2.0, // Y flipped
            );
            self.ndc = ndc.clamp(Vec2::NEG_ONE, Vec2::ONE);
        }
    }

    /// Process a winit window event. Returns `true` if pointer state changed.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.inside = true;
                self.set_cursor_position(position.x, position.y);
                true
            }
            WindowEvent::CursorEntered { .. } => {
                self.inside = true;
                false
            }
            WindowEvent::CursorLeft { .. } => {
                self.inside = false;
                false
            }
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
                false
            }
            _ => false,
        }
    }
}

impl PointerSource for PointerTracker {
    fn sample(&self) -> PointerState {
        PointerState::new(self.ndc, self.size())
    }
}

impl ViewportSource for PointerTracker {
    fn size(&self) -> Vec2 {
        Vec2::new(self.window_size.0 as f32, self.window_size.1 as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_of_window_is_origin() {
        let mut tracker = PointerTracker::new(800, 600);
        tracker.set_cursor_position(400.0, 300.0);
        assert!(tracker.ndc().length() < 1e-6);
    }

    #[test]
    fn corners_map_to_unit_square_with_y_up() {
        let mut tracker = PointerTracker::new(800, 600);
        tracker.set_cursor_position(0.0, 0.0);
        assert_eq!(tracker.ndc(), Vec2::new(-1.0, 1.0));
        tracker.set_cursor_position(800.0, 600.0);
        assert_eq!(tracker.ndc(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn positions_outside_window_are_clamped() {
        let mut tracker = PointerTracker::new(100, 100);
        tracker.set_cursor_position(-50.0, 250.0);
        assert_eq!(tracker.ndc(), Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn last_sample_wins_and_persists() {
        let mut tracker = PointerTracker::new(200, 200);
        tracker.set_cursor_position(10.0, 10.0);
        tracker.set_cursor_position(150.0, 50.0);
        let sample = tracker.sample();
        assert_eq!(sample.ndc, Vec2::new(0.5, 0.5));
        assert_eq!(sample.viewport_size, Vec2::new(200.0, 200.0));

        tracker.inside = false;
        assert_eq!(tracker.sample().ndc, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn zero_sized_window_keeps_previous_ndc() {
        let mut tracker = PointerTracker::new(100, 100);
        tracker.set_cursor_position(75.0, 25.0);
        tracker.set_window_size(0, 0);
        tracker.set_cursor_position(10.0, 10.0);
        assert_eq!(tracker.ndc(), Vec2::new(0.5, 0.5));
        assert_eq!(tracker.size(), Vec2::ZERO);
    }
}

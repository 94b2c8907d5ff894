//! Pointer state feeding the attraction effect.
//!
//! Cursor-move events write the last known position in normalized device
//! coordinates; the frame callback reads it. Both run on the event-loop
//! thread, so plain fields are enough; a multi-threaded port would need to
//! hand these two floats across with atomics or a channel.

use crate::Vec2;

/// Horizontal deadzone: attraction stays off until the pointer drifts this
/// far from center. Tuned empirically, preserved verbatim.
pub const DEADZONE: f32 = 0.1;

/// World-space radius around the anchor inside which particles are pulled.
pub const CAPTURE_RADIUS: f32 = 3.0;

/// Blend factor for the exponential-smoothing nudge toward the anchor.
pub const INFLUENCE: f32 = 0.12;

/// Scale from normalized pointer coordinates to the world-space anchor.
const ANCHOR_SCALE: Vec2 = Vec2::new(10.0, 5.0);

/// Last known pointer position in normalized device coordinates.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pointer {
    ndc: Vec2,
}

impl Pointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cursor position in window pixels.
    ///
    /// Maps to roughly [-1, 1] on each axis, y up. Ignored while the window
    /// reports a zero dimension (mid-resize on some platforms).
    pub fn set_position(&mut self, x: f64, y: f64, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.ndc.x = (x / width as f64) as f32 * 2.0 - 1.0;
        self.ndc.y = -((y / height as f64) as f32 * 2.0 - 1.0);
    }

    /// Normalized pointer position.
    #[inline]
    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    /// Whether the pointer is outside the horizontal deadzone.
    #[inline]
    pub fn active(&self) -> bool {
        self.ndc.x.abs() > DEADZONE
    }

    /// World-space attraction anchor for the current pointer position.
    #[inline]
    pub fn anchor(&self) -> Vec2 {
        self.ndc * ANCHOR_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndc_mapping() {
        let mut pointer = Pointer::new();
        pointer.set_position(1536.0, 384.0, 2048, 768);
        assert!((pointer.ndc().x - 0.5).abs() < 1e-6);
        assert!(pointer.ndc().y.abs() < 1e-6);

        // Top-left corner maps to (-1, 1).
        pointer.set_position(0.0, 0.0, 800, 600);
        assert!((pointer.ndc().x + 1.0).abs() < 1e-6);
        assert!((pointer.ndc().y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_deadzone() {
        let mut pointer = Pointer::new();
        assert!(!pointer.active());

        pointer.set_position(420.0, 300.0, 800, 600); // ndc.x = 0.05
        assert!(!pointer.active());

        pointer.set_position(600.0, 300.0, 800, 600); // ndc.x = 0.5
        assert!(pointer.active());
    }

    #[test]
    fn test_anchor_scale() {
        let mut pointer = Pointer::new();
        pointer.set_position(600.0, 150.0, 800, 600); // ndc (0.5, 0.5)
        let anchor = pointer.anchor();
        assert!((anchor.x - 5.0).abs() < 1e-5);
        assert!((anchor.y - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_zero_size_window_ignored() {
        let mut pointer = Pointer::new();
        pointer.set_position(600.0, 150.0, 800, 600);
        let before = pointer.ndc();
        pointer.set_position(100.0, 100.0, 0, 600);
        assert_eq!(pointer.ndc(), before);
    }
}

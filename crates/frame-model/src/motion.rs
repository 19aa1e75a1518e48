//! Motion estimates and regions of interest.
//!
//! All coordinates are in pixels of the frame they refer to.

use serde::{Deserialize, Serialize};

/// Apparent motion of content between two frames.
///
/// `(dx, dy)` is the displacement of content from the earlier frame to the
/// later one over `dt_micros`. When `valid` is false the estimator declined
/// to produce an estimate and consumers must assume no motion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageMotion {
    /// Horizontal displacement in pixels.
    pub dx: f64,
    /// Vertical displacement in pixels.
    pub dy: f64,
    /// Elapsed time the displacement spans (microseconds).
    pub dt_micros: u64,
    /// Whether the displacement is meaningful.
    pub valid: bool,
}

impl ImageMotion {
    /// A valid estimate.
    pub fn new(dx: f64, dy: f64, dt_micros: u64) -> Self {
        Self {
            dx,
            dy,
            dt_micros,
            valid: true,
        }
    }

    /// A declined estimate: zero displacement, `valid == false`.
    pub fn invalid(dt_micros: u64) -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            dt_micros,
            valid: false,
        }
    }

    /// The displacement to apply: the estimate itself, or zero when invalid.
    pub fn effective(&self) -> (f64, f64) {
        if self.valid {
            (self.dx, self.dy)
        } else {
            (0.0, 0.0)
        }
    }

    /// Displacement after a fraction `t` of the elapsed time, assuming
    /// constant velocity.
    pub fn scaled(&self, t: f64) -> (f64, f64) {
        let (dx, dy) = self.effective();
        (dx * t, dy * t)
    }

    /// Length of the displacement vector.
    pub fn magnitude(&self) -> f64 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }
}

/// Axis-aligned rectangle in pixel coordinates.
///
/// May extend past the frame; use [`FrameRect::clamp_to`] before reading
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FrameRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of the given size centered on `(cx, cy)`, e.g. a subject
    /// center reported by a tracker.
    pub fn centered(cx: i32, cy: i32, width: i32, height: i32) -> Self {
        Self::new(cx - width / 2, cy - height / 2, width, height)
    }

    /// The whole frame.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Area in pixels (zero for degenerate rectangles).
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Intersect with a `width` x `height` frame.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<FrameRect> {
        if self.is_empty() {
            return None;
        }
        let left = (self.x as i64).max(0);
        let top = (self.y as i64).max(0);
        let right = self.right().min(width as i64);
        let bottom = self.bottom().min(height as i64);
        if right <= left || bottom <= top {
            return None;
        }
        Some(FrameRect::new(
            left as i32,
            top as i32,
            (right - left) as i32,
            (bottom - top) as i32,
        ))
    }
}

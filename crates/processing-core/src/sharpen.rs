//! Unsharp-mask sharpening.
//!
//! `out = orig + strength * (orig - blur)` per channel, where `blur` is the
//! separable 3x3 binomial kernel `[1 2 1] ⊗ [1 2 1] / 16` with replicated
//! borders. The frame is modified in place; its payload is copied first if
//! another descriptor (for instance a cache entry) still references it.

use serde::{Deserialize, Serialize};

use interframe_common::config::InterpolationDefaults;
use interframe_frame_model::frame::FrameDescriptor;

/// Sharpening configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpenConfig {
    /// Amount of high-frequency detail added back. Zero disables the filter.
    pub strength: f32,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        Self { strength: 0.5 }
    }
}

impl SharpenConfig {
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }

    /// Build from the application-wide interpolation defaults.
    pub fn from_defaults(defaults: &InterpolationDefaults) -> Self {
        Self::new(defaults.sharpen_strength)
    }

    fn is_noop(&self) -> bool {
        !self.strength.is_finite() || self.strength <= 0.0
    }
}

/// Sharpen `frame` in place.
///
/// Geometry, timestamps, and identity are untouched, as are stride padding
/// bytes.
pub fn sharpen(frame: &mut FrameDescriptor, config: &SharpenConfig) {
    if config.is_noop() {
        return;
    }

    let geometry = frame.geometry();
    let width = geometry.width as usize;
    let height = geometry.height as usize;
    let bpp = geometry.bytes_per_pixel;
    let row_bytes = geometry.row_bytes();

    // Horizontal pass into a packed scratch plane, weights summing to 4.
    let src = frame.data();
    let mut horizontal = vec![0u16; height * row_bytes];
    for y in 0..height {
        let row = &src[y * geometry.line_stride..][..row_bytes];
        let out = &mut horizontal[y * row_bytes..][..row_bytes];
        for x in 0..width {
            let left = x.saturating_sub(1) * bpp;
            let right = (x + 1).min(width - 1) * bpp;
            let here = x * bpp;
            for c in 0..bpp {
                out[here + c] =
                    row[left + c] as u16 + 2 * row[here + c] as u16 + row[right + c] as u16;
            }
        }
    }

    // Vertical pass, weights summing to 4 again, then the mask.
    let strength = config.strength;
    let data = frame.data_mut();
    for y in 0..height {
        let above = &horizontal[y.saturating_sub(1) * row_bytes..][..row_bytes];
        let center = &horizontal[y * row_bytes..][..row_bytes];
        let below = &horizontal[(y + 1).min(height - 1) * row_bytes..][..row_bytes];
        let row = &mut data[y * geometry.line_stride..][..row_bytes];

        for i in 0..row_bytes {
            let blur = (above[i] as f32 + 2.0 * center[i] as f32 + below[i] as f32) / 16.0;
            let orig = row[i] as f32;
            row[i] = (orig + strength * (orig - blur)).round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interframe_frame_model::frame::FrameGeometry;
    use std::sync::Arc;

    /// Single-channel 16x4 frame with a vertical step edge.
    fn step_edge() -> FrameDescriptor {
        let geometry = FrameGeometry::packed(16, 4, 1);
        let mut data = vec![0u8; geometry.required_bytes()];
        for y in 0..4 {
            for x in 0..16 {
                data[y * 16 + x] = if x < 8 { 100 } else { 150 };
            }
        }
        FrameDescriptor::new("clip.mp4", 5.0, geometry, data)
            .unwrap()
            .with_timestamp_micros(166_666)
    }

    fn gradient_energy(frame: &FrameDescriptor) -> u64 {
        let data = frame.data();
        (0..4)
            .flat_map(|y| (0..15).map(move |x| (x, y)))
            .map(|(x, y)| {
                let d = data[y * 16 + x + 1] as i64 - data[y * 16 + x] as i64;
                (d * d) as u64
            })
            .sum()
    }

    #[test]
    fn test_edge_overshoot() {
        let mut frame = step_edge();
        sharpen(&mut frame, &SharpenConfig::new(0.5));
        let row = &frame.data()[..16];
        assert_eq!(row[0], 100);
        assert_eq!(row[7], 94);
        assert_eq!(row[8], 156);
        assert_eq!(row[15], 150);
    }

    #[test]
    fn test_contrast_increases_each_pass() {
        let mut frame = step_edge();
        let original = gradient_energy(&frame);
        sharpen(&mut frame, &SharpenConfig::default());
        let once = gradient_energy(&frame);
        sharpen(&mut frame, &SharpenConfig::default());
        let twice = gradient_energy(&frame);
        assert!(once > original);
        assert!(twice > once);
    }

    #[test]
    fn test_zero_strength_is_noop() {
        let mut frame = step_edge();
        let before = Arc::as_ptr(frame.shared_data());
        let original = frame.data().to_vec();
        sharpen(&mut frame, &SharpenConfig::new(0.0));
        sharpen(&mut frame, &SharpenConfig::new(f32::NAN));
        assert_eq!(frame.data(), &original[..]);
        assert_eq!(Arc::as_ptr(frame.shared_data()), before);
    }

    #[test]
    fn test_identity_and_geometry_unchanged() {
        let mut frame = step_edge().with_zoom(true);
        let key = frame.key().to_string();
        let geometry = frame.geometry();
        sharpen(&mut frame, &SharpenConfig::new(1.0));
        assert_eq!(frame.key(), key);
        assert_eq!(frame.geometry(), geometry);
        assert_eq!(frame.timestamp_micros, 166_666);
        assert_eq!(frame.timestamp_millis(), 166);
        assert_eq!(frame.frame_number(), 5.0);
    }

    #[test]
    fn test_uniform_frame_unchanged() {
        let geometry = FrameGeometry::rgba(5, 5);
        let mut frame =
            FrameDescriptor::new("clip.mp4", 0.0, geometry, vec![77; geometry.required_bytes()])
                .unwrap();
        sharpen(&mut frame, &SharpenConfig::new(2.0));
        assert!(frame.data().iter().all(|&v| v == 77));
    }

    #[test]
    fn test_shared_payload_is_copied_before_writing() {
        let cached = Arc::new(step_edge());
        let mut working = (*cached).clone();
        sharpen(&mut working, &SharpenConfig::default());

        assert!(!working.shares_payload_with(&cached));
        assert_eq!(cached.data()[7], 100);
        assert_eq!(working.data()[7], 94);
    }

    #[test]
    fn test_padding_untouched() {
        let geometry = FrameGeometry::new(3, 3, 5, 1);
        let data = vec![10, 200, 10, 0xEE, 0xEE, 200, 10, 200, 0xEE, 0xEE, 10, 200, 10, 0xEE, 0xEE];
        let mut frame = FrameDescriptor::new("clip.mp4", 0.0, geometry, data).unwrap();
        sharpen(&mut frame, &SharpenConfig::new(1.0));
        for y in 0..3 {
            assert_eq!(&frame.data()[y * 5 + 3..y * 5 + 5], &[0xEE, 0xEE]);
        }
    }
}

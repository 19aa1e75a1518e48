//! Synthetic test footage.
//!
//! A smooth, aperiodic-looking BGRA pattern defined at real-valued
//! coordinates, so the ideal frame for any fractional displacement is known
//! exactly.

use anyhow::Context;

use interframe_common::clock::frame_timestamp_micros;
use interframe_frame_model::frame::{FrameDescriptor, FrameGeometry};
use interframe_frame_model::motion::FrameRect;

pub const SOURCE_ID: &str = "synthetic";
pub const FPS: f64 = 30.0;

fn luma(x: f64, y: f64) -> f64 {
    128.0
        + 55.0 * (x * 0.37).sin()
        + 45.0 * (y * 0.29).cos()
        + 20.0 * ((x + 1.7 * y) * 0.113).sin()
}

/// Pattern displaced by `(dx, dy)` as frame `frame_number` of the sequence.
pub fn frame(
    width: u32,
    height: u32,
    frame_number: f64,
    (dx, dy): (f64, f64),
) -> anyhow::Result<FrameDescriptor> {
    let geometry = FrameGeometry::rgba(width, height);
    let mut data = vec![0u8; geometry.required_bytes()];
    for y in 0..height as usize {
        for x in 0..width as usize {
            let v = luma(x as f64 - dx, y as f64 - dy).round().clamp(0.0, 255.0) as u8;
            let o = geometry.offset(x, y);
            data[o..o + 4].copy_from_slice(&[v, v, v, 255]);
        }
    }

    let frame = FrameDescriptor::new(SOURCE_ID, frame_number, geometry, data)
        .with_context(|| format!("Failed to build {width}x{height} synthetic frame"))?;
    Ok(frame
        .with_sequence(frame_number as u32, 2, FPS)
        .with_timestamp_micros(frame_timestamp_micros(frame_number, FPS)))
}

/// Centered region covering half of each dimension.
pub fn center_roi(width: u32, height: u32) -> FrameRect {
    FrameRect::centered(
        width as i32 / 2,
        height as i32 / 2,
        width as i32 / 2,
        height as i32 / 2,
    )
}

/// Mean absolute difference of the first channel, ignoring a border of
/// `margin` pixels where edge replication makes the ideal undefined.
pub fn mean_abs_error(actual: &FrameDescriptor, ideal: &FrameDescriptor, margin: usize) -> f64 {
    let geometry = actual.geometry();
    let (width, height) = (geometry.width as usize, geometry.height as usize);
    if width <= 2 * margin || height <= 2 * margin {
        return 0.0;
    }

    let (mut total, mut count) = (0u64, 0u64);
    for y in margin..height - margin {
        for x in margin..width - margin {
            let o = geometry.offset(x, y);
            total += actual.data()[o].abs_diff(ideal.data()[o]) as u64;
            count += 1;
        }
    }
    total as f64 / count as f64
}

//! Timestamp utilities for frame timing.
//!
//! Frames carry a single microsecond timestamp; the millisecond view is
//! always derived from it so the two resolutions cannot drift apart.
//! This module provides the conversions used by decoders handing frames
//! to the core and by synthesis when placing new frames in time.

/// Convert a microsecond timestamp to milliseconds (truncating).
pub fn micros_to_millis(micros: u64) -> u64 {
    micros / 1_000
}

/// Convert microseconds to seconds.
pub fn micros_to_secs(micros: u64) -> f64 {
    micros as f64 / 1_000_000.0
}

/// Convert seconds to microseconds. Negative input saturates to zero.
pub fn secs_to_micros(secs: f64) -> u64 {
    (secs * 1_000_000.0).round().max(0.0) as u64
}

/// Presentation time of a (possibly fractional) frame number at `fps`.
///
/// Returns 0 when `fps` is not a positive finite rate.
pub fn frame_timestamp_micros(frame_number: f64, fps: f64) -> u64 {
    if !fps.is_finite() || fps <= 0.0 {
        return 0;
    }
    secs_to_micros(frame_number / fps)
}

/// Linearly interpolate between two microsecond timestamps.
///
/// Works for `b < a` as well; `t` is clamped to `[0, 1]`.
pub fn lerp_micros(a: u64, b: u64, t: f64) -> u64 {
    let t = t.clamp(0.0, 1.0);
    let delta = b as i128 - a as i128;
    let offset = (delta as f64 * t).round() as i128;
    (a as i128 + offset).max(0) as u64
}

/// Elapsed time between two microsecond timestamps, in either order.
pub fn elapsed_micros(a: u64, b: u64) -> u64 {
    a.abs_diff(b)
}

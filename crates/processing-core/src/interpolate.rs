//! Motion-compensated frame interpolation.
//!
//! Synthesizes the frame at fraction `pct` of the way from frame A to
//! frame B. Motion is estimated once over the region of interest and the
//! resulting displacement is applied uniformly to the whole frame,
//! assuming constant velocity between the two reference timestamps:
//!
//! - the **shifted** frame is A displaced by `pct * motion`;
//! - the **blended** frame mixes that with B displaced back by
//!   `(1 - pct) * motion`, weighted `(1 - pct, pct)`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use interframe_common::clock::{elapsed_micros, lerp_micros};
use interframe_common::config::InterpolationDefaults;
use interframe_common::error::{InterframeError, InterframeResult};
use interframe_frame_model::frame::{FrameDescriptor, FrameGeometry};
use interframe_frame_model::motion::{FrameRect, ImageMotion};

use crate::motion::{ensure_same_geometry, MotionConfig, MotionEstimator};

/// Which outputs to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Motion-compensated cross-dissolve of A and B, plus the shift-only frame.
    Blend,
    /// Only A displaced along the motion.
    ShiftOnly,
}

impl InterpolationMode {
    /// Map a legacy `blend` flag.
    pub fn from_blend_flag(blend: bool) -> Self {
        if blend {
            Self::Blend
        } else {
            Self::ShiftOnly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blend => "blend",
            Self::ShiftOnly => "shift",
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one interpolation.
#[derive(Debug, Clone)]
pub struct InterpResult {
    /// Blended frame; `None` in [`InterpolationMode::ShiftOnly`].
    pub blended: Option<FrameDescriptor>,
    /// A displaced along the motion, without B's pixels.
    pub shifted: FrameDescriptor,
    /// Motion used (invalid when estimation declined or was skipped).
    pub motion: ImageMotion,
}

/// Interpolation engine bound to a motion estimator configuration.
#[derive(Debug, Clone, Default)]
pub struct FrameInterpolator {
    estimator: MotionEstimator,
}

impl FrameInterpolator {
    /// Create an interpolator with the default estimator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_estimator(estimator: MotionEstimator) -> Self {
        Self { estimator }
    }

    /// Build from the application-wide interpolation defaults.
    pub fn from_defaults(defaults: &InterpolationDefaults) -> Self {
        Self::with_estimator(MotionEstimator::with_config(MotionConfig::from_defaults(
            defaults,
        )))
    }

    pub fn estimator(&self) -> &MotionEstimator {
        &self.estimator
    }

    /// Synthesize the frame at `pct_a_to_b` between `frame_a` (0) and
    /// `frame_b` (1).
    ///
    /// Fails without computing anything when the geometry of the frames
    /// differs or `pct_a_to_b` is outside `[0, 1]`. At exactly
    /// 0 or 1 no estimation runs and the outputs share the payload of A
    /// or B respectively.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(a = frame_a.key(), b = frame_b.key(), pct = pct_a_to_b, mode = %mode)
    )]
    pub fn interpolate(
        &self,
        frame_a: &FrameDescriptor,
        frame_b: &FrameDescriptor,
        pct_a_to_b: f64,
        roi: FrameRect,
        mode: InterpolationMode,
    ) -> InterframeResult<InterpResult> {
        validate_inputs(frame_a, frame_b, pct_a_to_b)?;

        let frame_number = lerp(frame_a.frame_number(), frame_b.frame_number(), pct_a_to_b);
        let timestamp = lerp_micros(
            frame_a.timestamp_micros,
            frame_b.timestamp_micros,
            pct_a_to_b,
        );

        if pct_a_to_b == 0.0 || pct_a_to_b == 1.0 {
            let source = if pct_a_to_b == 0.0 { frame_a } else { frame_b };
            let dt = elapsed_micros(frame_a.timestamp_micros, frame_b.timestamp_micros);
            let motion = ImageMotion::invalid(dt);
            let mut frame = synthesized(frame_a, frame_number, timestamp, source.shared_data())?;
            frame.motion = motion;
            frame.debug = format!("{mode} pct={pct_a_to_b:.3} reference");

            return Ok(InterpResult {
                blended: (mode == InterpolationMode::Blend).then(|| frame.clone()),
                shifted: frame,
                motion,
            });
        }

        let motion = self.estimator.estimate(frame_a, frame_b, roi)?;
        let (dx, dy) = motion.effective();
        let (sx, sy) = motion.scaled(pct_a_to_b);
        let geometry = frame_a.geometry();

        let from_a = ShiftSampler::new(geometry, -sx, -sy);
        let mut shifted_data = frame_a.data().to_vec();
        render_shift(&mut shifted_data, frame_a.data(), geometry, &from_a);

        let note = format!("{mode} pct={pct_a_to_b:.3} shift=({sx:.2},{sy:.2})");
        let mut shifted = synthesized(frame_a, frame_number, timestamp, &Arc::new(shifted_data))?;
        shifted.motion = motion;
        shifted.debug = note.clone();

        let blended = match mode {
            InterpolationMode::ShiftOnly => None,
            InterpolationMode::Blend => {
                let back = 1.0 - pct_a_to_b;
                let from_b = ShiftSampler::new(geometry, dx * back, dy * back);
                let mut blended_data = frame_a.data().to_vec();
                render_blend(
                    &mut blended_data,
                    (frame_a.data(), &from_a),
                    (frame_b.data(), &from_b),
                    pct_a_to_b as f32,
                    geometry,
                );
                let mut blended =
                    synthesized(frame_a, frame_number, timestamp, &Arc::new(blended_data))?;
                blended.motion = motion;
                blended.debug = note;
                Some(blended)
            }
        };

        tracing::debug!(
            valid = motion.valid,
            dx = motion.dx,
            dy = motion.dy,
            frame_number,
            "Interpolated frame"
        );

        Ok(InterpResult {
            blended,
            shifted,
            motion,
        })
    }
}

/// Interpolate with the default estimator configuration.
pub fn interpolate(
    frame_a: &FrameDescriptor,
    frame_b: &FrameDescriptor,
    pct_a_to_b: f64,
    roi: FrameRect,
    mode: InterpolationMode,
) -> InterframeResult<InterpResult> {
    FrameInterpolator::new().interpolate(frame_a, frame_b, pct_a_to_b, roi, mode)
}

fn validate_inputs(
    frame_a: &FrameDescriptor,
    frame_b: &FrameDescriptor,
    pct_a_to_b: f64,
) -> InterframeResult<()> {
    ensure_same_geometry(frame_a, frame_b)?;
    if !(0.0..=1.0).contains(&pct_a_to_b) {
        return Err(InterframeError::invalid_fraction(pct_a_to_b));
    }
    Ok(())
}

/// Exact at both ends, unlike `a + (b - a) * t`.
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// New descriptor carrying A's identity at the interpolated position.
fn synthesized(
    frame_a: &FrameDescriptor,
    frame_number: f64,
    timestamp_micros: u64,
    data: &Arc<Vec<u8>>,
) -> InterframeResult<FrameDescriptor> {
    let frame = frame_a
        .derive(frame_number, Arc::clone(data))
        .map_err(|e| InterframeError::processing(e.to_string()))?;
    Ok(frame.with_timestamp_micros(timestamp_micros))
}

/// Bilinear sampler for a uniform displacement.
///
/// Reads the source at `(x + ox, y + oy)` with edge replication. Because
/// the offset is the same for every pixel, the weights and the clamped
/// source rows/columns are computed once.
struct ShiftSampler {
    /// Byte offsets of the two source columns for each output column.
    cols: Vec<(usize, usize)>,
    /// Byte offsets of the two source rows for each output row.
    rows: Vec<(usize, usize)>,
    /// Weights of (x0,y0), (x1,y0), (x0,y1), (x1,y1).
    weights: [f32; 4],
}

impl ShiftSampler {
    fn new(geometry: FrameGeometry, ox: f64, oy: f64) -> Self {
        let (ix, fx) = (ox.floor(), ox - ox.floor());
        let (iy, fy) = (oy.floor(), oy - oy.floor());
        let ix = ix as i64;
        let iy = iy as i64;

        let max_x = geometry.width as i64 - 1;
        let max_y = geometry.height as i64 - 1;
        let bpp = geometry.bytes_per_pixel;
        let stride = geometry.line_stride;

        let cols = (0..=max_x)
            .map(|x| {
                let x0 = (x + ix).clamp(0, max_x) as usize;
                let x1 = (x + ix + 1).clamp(0, max_x) as usize;
                (x0 * bpp, x1 * bpp)
            })
            .collect();
        let rows = (0..=max_y)
            .map(|y| {
                let y0 = (y + iy).clamp(0, max_y) as usize;
                let y1 = (y + iy + 1).clamp(0, max_y) as usize;
                (y0 * stride, y1 * stride)
            })
            .collect();

        let weights = [
            ((1.0 - fx) * (1.0 - fy)) as f32,
            (fx * (1.0 - fy)) as f32,
            ((1.0 - fx) * fy) as f32,
            (fx * fy) as f32,
        ];

        Self {
            cols,
            rows,
            weights,
        }
    }

    #[inline]
    fn sample(&self, src: &[u8], x: usize, y: usize, channel: usize) -> f32 {
        let (r0, r1) = self.rows[y];
        let (c0, c1) = self.cols[x];
        let [w00, w10, w01, w11] = self.weights;
        src[r0 + c0 + channel] as f32 * w00
            + src[r0 + c1 + channel] as f32 * w10
            + src[r1 + c0 + channel] as f32 * w01
            + src[r1 + c1 + channel] as f32 * w11
    }
}

#[inline]
fn to_byte(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn render_shift(out: &mut [u8], src: &[u8], geometry: FrameGeometry, sampler: &ShiftSampler) {
    let bpp = geometry.bytes_per_pixel;
    for y in 0..geometry.height as usize {
        let row = y * geometry.line_stride;
        for x in 0..geometry.width as usize {
            let px = row + x * bpp;
            for c in 0..bpp {
                out[px + c] = to_byte(sampler.sample(src, x, y, c));
            }
        }
    }
}

fn render_blend(
    out: &mut [u8],
    (src_a, from_a): (&[u8], &ShiftSampler),
    (src_b, from_b): (&[u8], &ShiftSampler),
    weight_b: f32,
    geometry: FrameGeometry,
) {
    let weight_a = 1.0 - weight_b;
    let bpp = geometry.bytes_per_pixel;
    for y in 0..geometry.height as usize {
        let row = y * geometry.line_stride;
        for x in 0..geometry.width as usize {
            let px = row + x * bpp;
            for c in 0..bpp {
                let a = from_a.sample(src_a, x, y, c);
                let b = from_b.sample(src_b, x, y, c);
                out[px + c] = to_byte(a * weight_a + b * weight_b);
            }
        }
    }
}

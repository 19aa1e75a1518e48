//! Interpolate one synthetic frame pair and report how close the result
//! lands to the ideal in-between frame.

use serde::Serialize;

use interframe_common::config::AppConfig;
use interframe_frame_model::frame::{FrameDescriptor, FrameSummary};
use interframe_frame_model::motion::{FrameRect, ImageMotion};
use interframe_processing_core::{
    sharpen, FrameCache, FrameInterpolator, InterpolationMode, SharpenConfig,
};

use crate::pattern;

pub struct SynthArgs {
    pub width: u32,
    pub height: u32,
    pub dx: f64,
    pub dy: f64,
    pub pct: f64,
    pub mode: InterpolationMode,
    pub sharpen: Option<f32>,
}

#[derive(Serialize)]
struct OutputReport {
    frame: FrameSummary,
    mean_abs_error: f64,
}

#[derive(Serialize)]
struct SynthReport {
    mode: InterpolationMode,
    pct: f64,
    roi: FrameRect,
    motion: ImageMotion,
    sharpen: Option<f32>,
    /// Error of simply repeating the first frame, for comparison.
    repeat_error: f64,
    shifted: OutputReport,
    blended: Option<OutputReport>,
    cache_keys: Vec<String>,
}

pub fn run(config: &AppConfig, args: SynthArgs) -> anyhow::Result<()> {
    let SynthArgs {
        width,
        height,
        dx,
        dy,
        pct,
        mode,
        sharpen: strength,
    } = args;

    let frame_a = pattern::frame(width, height, 0.0, (0.0, 0.0))?;
    let frame_b = pattern::frame(width, height, 1.0, (dx, dy))?;
    let ideal = pattern::frame(width, height, pct, (dx * pct, dy * pct))?;
    let roi = pattern::center_roi(width, height);

    let interpolator = FrameInterpolator::from_defaults(&config.interpolation);
    let mut result = interpolator.interpolate(&frame_a, &frame_b, pct, roi, mode)?;

    tracing::info!(
        valid = result.motion.valid,
        dx = result.motion.dx,
        dy = result.motion.dy,
        "Estimated motion"
    );

    if let Some(strength) = strength {
        let sharpen_config = SharpenConfig::new(strength);
        sharpen(&mut result.shifted, &sharpen_config);
        if let Some(blended) = result.blended.as_mut() {
            sharpen(blended, &sharpen_config);
        }
    }

    let margin = dx.abs().max(dy.abs()).ceil() as usize + 2;
    let report_for = |frame: &FrameDescriptor| OutputReport {
        frame: frame.summary(),
        mean_abs_error: pattern::mean_abs_error(frame, &ideal, margin),
    };

    let shifted = report_for(&result.shifted);
    let blended = result.blended.as_ref().map(report_for);

    let mut cache = FrameCache::with_capacity(config.interpolation.cache_capacity);
    cache.insert(frame_a.clone());
    cache.insert(frame_b);
    if let Some(frame) = result.blended {
        cache.insert(frame);
    }
    cache.insert(result.shifted);

    let report = SynthReport {
        mode,
        pct,
        roi,
        motion: result.motion,
        sharpen: strength,
        repeat_error: pattern::mean_abs_error(&frame_a, &ideal, margin),
        shifted,
        blended,
        cache_keys: cache.keys().map(str::to_owned).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

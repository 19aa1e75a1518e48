//! Run interpolation jobs concurrently against one shared frame cache.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use interframe_common::config::AppConfig;
use interframe_frame_model::frame::FrameDescriptor;
use interframe_frame_model::key::format_key;
use interframe_processing_core::{FrameInterpolator, InterpolationMode, SharedFrameCache};

use crate::pattern;

#[derive(Serialize)]
struct BatchReport {
    jobs: usize,
    valid_motion: usize,
    cache_capacity: usize,
    cache_len: usize,
    keys: Vec<String>,
}

pub async fn run(
    config: &AppConfig,
    jobs: usize,
    width: u32,
    height: u32,
    shift: (f64, f64),
    mode: InterpolationMode,
) -> anyhow::Result<()> {
    let cache = SharedFrameCache::with_capacity(config.interpolation.cache_capacity);
    cache.insert(pattern::frame(width, height, 0.0, (0.0, 0.0))?);
    cache.insert(pattern::frame(width, height, 1.0, shift)?);

    // Jobs may evict the references, so resolve them once up front.
    let frame_a = cache
        .lookup(&format_key(pattern::SOURCE_ID, 0.0, false))
        .context("First reference frame missing from cache")?;
    let frame_b = cache
        .lookup(&format_key(pattern::SOURCE_ID, 1.0, false))
        .context("Second reference frame missing from cache")?;

    let interpolator = Arc::new(FrameInterpolator::from_defaults(&config.interpolation));
    let roi = pattern::center_roi(width, height);

    let handles: Vec<_> = (1..=jobs)
        .map(|job| {
            let pct = job as f64 / (jobs + 1) as f64;
            let cache = cache.clone();
            let interpolator = Arc::clone(&interpolator);
            let (frame_a, frame_b) = (Arc::clone(&frame_a), Arc::clone(&frame_b));

            tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
                let result = interpolator.interpolate(&frame_a, &frame_b, pct, roi, mode)?;
                let valid = result.motion.valid;
                let output: FrameDescriptor = result.blended.unwrap_or(result.shifted);
                tracing::debug!(job, key = output.key(), "Job finished");
                cache.insert(output);
                Ok(valid)
            })
        })
        .collect();

    let mut valid_motion = 0;
    for handle in handles {
        if handle.await.context("Interpolation job panicked")?? {
            valid_motion += 1;
        }
    }

    tracing::info!(jobs, valid_motion, cached = cache.len(), "Batch complete");

    let report = BatchReport {
        jobs,
        valid_motion,
        cache_capacity: config.interpolation.cache_capacity,
        cache_len: cache.len(),
        keys: cache.keys(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

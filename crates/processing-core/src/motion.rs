//! Region-restricted motion estimation.
//!
//! Estimates a single displacement for the content of a region of
//! interest between two frames.
//!
//! # Algorithm
//!
//! 1. **Clamp** the region to the frame; an empty result declines.
//! 2. **Luma** is sampled from the first three channels of each pixel.
//! 3. **Texture gate:** a region whose mean absolute luma gradient is below
//!    `min_texture` cannot be tracked and declines.
//! 4. **Full search** over `[-search_range, search_range]²`, scoring each
//!    candidate by the mean absolute luma difference between the region in
//!    A and the displaced region in B, sampling every `sample_step` pixels.
//! 5. **Confidence:** the best score must not exceed `max_match_cost`.
//! 6. **Uniqueness:** every candidate outside the 3×3 neighbourhood of the
//!    best must score at least `ambiguity_margin × max(best, 1)` worse.
//!    Repeating textures and textures that vary along one axis only have
//!    several equally good matches and decline.
//! 7. **Sub-pixel** refinement fits a parabola through the scores around
//!    the best integer offset on each axis.
//!
//! Worst-case cost is `(area / sample_step²) × (2 search_range + 1)²`
//! sample comparisons. The search range is capped at the larger frame
//! dimension, beyond which no candidate can overlap the region.

use serde::{Deserialize, Serialize};

use interframe_common::clock::elapsed_micros;
use interframe_common::config::InterpolationDefaults;
use interframe_common::error::{InterframeError, InterframeResult};
use interframe_frame_model::frame::FrameDescriptor;
use interframe_frame_model::motion::{FrameRect, ImageMotion};

/// Configuration for the motion estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Largest displacement searched on each axis, in pixels.
    pub search_range: u32,

    /// Distance between sampled pixels when scoring candidates.
    pub sample_step: u32,

    /// Minimum mean absolute luma gradient of the region.
    pub min_texture: f64,

    /// Maximum mean absolute luma difference of an accepted match.
    pub max_match_cost: f64,

    /// Required lead of the best match over any distant candidate,
    /// relative to `max(best_cost, 1)`.
    pub ambiguity_margin: f64,

    /// Enable parabolic sub-pixel refinement.
    pub subpixel: bool,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self::from_defaults(&InterpolationDefaults::default())
    }
}

impl MotionConfig {
    /// Build from the application-wide interpolation defaults.
    pub fn from_defaults(defaults: &InterpolationDefaults) -> Self {
        Self {
            search_range: defaults.search_range,
            sample_step: defaults.sample_step,
            min_texture: defaults.min_texture,
            max_match_cost: defaults.max_match_cost,
            ambiguity_margin: defaults.ambiguity_margin,
            subpixel: defaults.subpixel,
        }
    }
}

/// Why an estimate was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The region has no area inside the frame.
    EmptyRegion,
    /// The region is too flat to track.
    Textureless,
    /// No candidate matched closely enough.
    NoConfidentMatch,
    /// Distant candidates match about as well as the best one.
    Ambiguous,
}

/// Estimate plus the measurements that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionAnalysis {
    pub motion: ImageMotion,
    /// Region after clamping to the frame.
    pub region: Option<FrameRect>,
    /// Mean absolute luma gradient of the region in frame A.
    pub texture: f64,
    /// Mean absolute luma difference at the best integer offset.
    pub best_cost: Option<f64>,
    pub rejection: Option<Rejection>,
}

impl MotionAnalysis {
    fn declined(region: Option<FrameRect>, dt_micros: u64, texture: f64, rejection: Rejection) -> Self {
        Self {
            motion: ImageMotion::invalid(dt_micros),
            region,
            texture,
            best_cost: None,
            rejection: Some(rejection),
        }
    }
}

/// The motion estimator.
#[derive(Debug, Clone, Default)]
pub struct MotionEstimator {
    config: MotionConfig,
}

impl MotionEstimator {
    /// Create an estimator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an estimator with the given configuration.
    pub fn with_config(config: MotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Displacement of `frame_b`'s content relative to `frame_a` within `roi`.
    pub fn estimate(
        &self,
        frame_a: &FrameDescriptor,
        frame_b: &FrameDescriptor,
        roi: FrameRect,
    ) -> InterframeResult<ImageMotion> {
        Ok(self.analyze(frame_a, frame_b, roi)?.motion)
    }

    /// Like [`estimate`](Self::estimate), also returning diagnostics.
    pub fn analyze(
        &self,
        frame_a: &FrameDescriptor,
        frame_b: &FrameDescriptor,
        roi: FrameRect,
    ) -> InterframeResult<MotionAnalysis> {
        ensure_same_geometry(frame_a, frame_b)?;

        let dt_micros = elapsed_micros(frame_a.timestamp_micros, frame_b.timestamp_micros);
        let Some(region) = roi.clamp_to(frame_a.width(), frame_a.height()) else {
            return Ok(MotionAnalysis::declined(None, dt_micros, 0.0, Rejection::EmptyRegion));
        };

        let range = self
            .config
            .search_range
            .min(frame_a.width().max(frame_a.height())) as i64;
        let step = self
            .config
            .sample_step
            .clamp(1, frame_a.width().max(frame_a.height())) as usize;

        let plane_a = LumaPlane::extract(frame_a, region);
        let texture = plane_a.mean_gradient(step);
        if texture < self.config.min_texture {
            return Ok(MotionAnalysis::declined(
                Some(region),
                dt_micros,
                texture,
                Rejection::Textureless,
            ));
        }

        let search_area = FrameRect::new(
            region.x - range as i32,
            region.y - range as i32,
            region.width + 2 * range as i32,
            region.height + 2 * range as i32,
        )
        .clamp_to(frame_b.width(), frame_b.height())
        .unwrap_or(region);
        let plane_b = LumaPlane::extract(frame_b, search_area);

        let samples = plane_a.samples(step);
        let costs = CostTable::search(&samples, &plane_b, range);
        let Some((best_dx, best_dy, best_cost)) = costs.best() else {
            return Ok(MotionAnalysis::declined(
                Some(region),
                dt_micros,
                texture,
                Rejection::NoConfidentMatch,
            ));
        };

        if best_cost > self.config.max_match_cost {
            tracing::debug!(best_cost, texture, "Motion estimate below confidence threshold");
            return Ok(MotionAnalysis {
                best_cost: Some(best_cost),
                ..MotionAnalysis::declined(
                    Some(region),
                    dt_micros,
                    texture,
                    Rejection::NoConfidentMatch,
                )
            });
        }

        if let Some(runner_up) = costs.runner_up(best_dx, best_dy) {
            if runner_up - best_cost < self.config.ambiguity_margin * best_cost.max(1.0) {
                tracing::debug!(best_cost, runner_up, "Motion estimate is ambiguous");
                return Ok(MotionAnalysis {
                    best_cost: Some(best_cost),
                    ..MotionAnalysis::declined(
                        Some(region),
                        dt_micros,
                        texture,
                        Rejection::Ambiguous,
                    )
                });
            }
        }

        let (mut dx, mut dy) = (best_dx as f64, best_dy as f64);
        if self.config.subpixel {
            dx += parabola_offset(
                costs.get(best_dx - 1, best_dy),
                best_cost,
                costs.get(best_dx + 1, best_dy),
            );
            dy += parabola_offset(
                costs.get(best_dx, best_dy - 1),
                best_cost,
                costs.get(best_dx, best_dy + 1),
            );
        }

        tracing::debug!(dx, dy, best_cost, texture, "Motion estimated");
        Ok(MotionAnalysis {
            motion: ImageMotion::new(dx, dy, dt_micros),
            region: Some(region),
            texture,
            best_cost: Some(best_cost),
            rejection: None,
        })
    }
}

/// Reject frame pairs whose geometry differs.
pub fn ensure_same_geometry(
    frame_a: &FrameDescriptor,
    frame_b: &FrameDescriptor,
) -> InterframeResult<()> {
    if frame_a.same_geometry(frame_b) {
        return Ok(());
    }
    Err(InterframeError::GeometryMismatch {
        expected_width: frame_a.width(),
        expected_height: frame_a.height(),
        expected_stride: frame_a.line_stride(),
        actual_width: frame_b.width(),
        actual_height: frame_b.height(),
        actual_stride: frame_b.line_stride(),
    })
}

/// Luma of one interleaved pixel.
fn luma(pixel: &[u8]) -> u8 {
    match pixel {
        [r, g, b, ..] => ((77 * *r as u32 + 150 * *g as u32 + 29 * *b as u32) >> 8) as u8,
        [v, ..] => *v,
        [] => 0,
    }
}

/// Luma values of a rectangle of a frame, addressed in frame coordinates.
struct LumaPlane {
    rect: FrameRect,
    values: Vec<u8>,
}

impl LumaPlane {
    fn extract(frame: &FrameDescriptor, rect: FrameRect) -> Self {
        let geometry = frame.geometry();
        let bpp = geometry.bytes_per_pixel;
        let data = frame.data();
        let mut values = Vec::with_capacity(rect.area() as usize);

        for y in rect.y..rect.y + rect.height {
            let row = geometry.offset(rect.x as usize, y as usize);
            let row = &data[row..row + rect.width as usize * bpp];
            values.extend(row.chunks_exact(bpp).map(luma));
        }

        Self { rect, values }
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.rect.x as i64
            && y >= self.rect.y as i64
            && x < self.rect.right()
            && y < self.rect.bottom()
    }

    fn at(&self, x: i64, y: i64) -> u8 {
        let col = (x - self.rect.x as i64) as usize;
        let row = (y - self.rect.y as i64) as usize;
        self.values[row * self.rect.width as usize + col]
    }

    fn sample_coords(&self, step: usize) -> impl Iterator<Item = (i64, i64)> + '_ {
        let xs = self.rect.x as i64..self.rect.right();
        (self.rect.y as i64..self.rect.bottom())
            .step_by(step)
            .flat_map(move |y| xs.clone().step_by(step).map(move |x| (x, y)))
    }

    fn samples(&self, step: usize) -> Vec<(i64, i64, u8)> {
        self.sample_coords(step)
            .map(|(x, y)| (x, y, self.at(x, y)))
            .collect()
    }

    /// Mean absolute difference to the right and lower neighbours.
    fn mean_gradient(&self, step: usize) -> f64 {
        let mut total = 0u64;
        let mut terms = 0u64;
        for (x, y) in self.sample_coords(step) {
            let v = self.at(x, y) as i32;
            if self.contains(x + 1, y) {
                total += (self.at(x + 1, y) as i32 - v).unsigned_abs() as u64;
                terms += 1;
            }
            if self.contains(x, y + 1) {
                total += (self.at(x, y + 1) as i32 - v).unsigned_abs() as u64;
                terms += 1;
            }
        }
        if terms == 0 {
            0.0
        } else {
            total as f64 / terms as f64
        }
    }
}

/// Match scores of every candidate displacement.
struct CostTable {
    range: i64,
    costs: Vec<Option<f64>>,
}

impl CostTable {
    fn search(samples: &[(i64, i64, u8)], plane_b: &LumaPlane, range: i64) -> Self {
        let side = (2 * range + 1) as usize;
        let mut costs = Vec::with_capacity(side * side);
        let min_overlap = samples.len().div_ceil(2).max(1);

        for dy in -range..=range {
            for dx in -range..=range {
                let mut sum = 0u64;
                let mut count = 0usize;
                for &(x, y, va) in samples {
                    let (bx, by) = (x + dx, y + dy);
                    if plane_b.contains(bx, by) {
                        sum += (plane_b.at(bx, by) as i32 - va as i32).unsigned_abs() as u64;
                        count += 1;
                    }
                }
                costs.push((count >= min_overlap).then(|| sum as f64 / count as f64));
            }
        }

        Self { range, costs }
    }

    fn get(&self, dx: i64, dy: i64) -> Option<f64> {
        if dx.abs() > self.range || dy.abs() > self.range {
            return None;
        }
        let side = 2 * self.range + 1;
        let idx = (dy + self.range) * side + (dx + self.range);
        self.costs[idx as usize]
    }

    /// Lowest-cost candidate; ties go to the shorter displacement.
    fn best(&self) -> Option<(i64, i64, f64)> {
        let mut best: Option<(i64, i64, f64)> = None;
        for dy in -self.range..=self.range {
            for dx in -self.range..=self.range {
                let Some(cost) = self.get(dx, dy) else {
                    continue;
                };
                let better = match best {
                    None => true,
                    Some((bx, by, bc)) => {
                        cost < bc || (cost == bc && dx * dx + dy * dy < bx * bx + by * by)
                    }
                };
                if better {
                    best = Some((dx, dy, cost));
                }
            }
        }
        best
    }

    /// Lowest cost outside the 3×3 neighbourhood of `(best_dx, best_dy)`.
    fn runner_up(&self, best_dx: i64, best_dy: i64) -> Option<f64> {
        let mut lowest: Option<f64> = None;
        for dy in -self.range..=self.range {
            for dx in -self.range..=self.range {
                if (dx - best_dx).abs() <= 1 && (dy - best_dy).abs() <= 1 {
                    continue;
                }
                if let Some(cost) = self.get(dx, dy) {
                    lowest = Some(lowest.map_or(cost, |l| l.min(cost)));
                }
            }
        }
        lowest
    }
}

/// Vertex of the parabola through `(−1, before)`, `(0, center)`, `(1, after)`,
/// limited to half a pixel.
fn parabola_offset(before: Option<f64>, center: f64, after: Option<f64>) -> f64 {
    let (Some(before), Some(after)) = (before, after) else {
        return 0.0;
    };
    let curvature = before - 2.0 * center + after;
    if curvature <= f64::EPSILON {
        return 0.0;
    }
    (0.5 * (before - after) / curvature).clamp(-0.5, 0.5)
}

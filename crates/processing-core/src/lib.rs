//! Interframe Processing Core: the interpolation engine
//!
//! Turns pairs of decoded frames into synthesized in-between frames:
//! - **Frame Cache:** Bounded MRU store of recently used frames, keyed by identity
//! - **Motion Estimation:** Region-restricted displacement search with sub-pixel refinement
//! - **Interpolation:** Motion-compensated blend and shift-only synthesis
//! - **Sharpening:** In-place unsharp mask with copy-on-write payloads
//!
//! This crate is pure computation with no I/O and no platform dependencies.
//! All inputs are data; all outputs are data. Everything except the
//! cache is free of shared state and safe to run on many worker threads.

pub mod cache;
pub mod interpolate;
pub mod motion;
pub mod sharpen;

pub use cache::{FrameCache, SharedFrameCache};
pub use interpolate::{interpolate, FrameInterpolator, InterpResult, InterpolationMode};
pub use motion::MotionEstimator;
pub use sharpen::{sharpen, SharpenConfig};

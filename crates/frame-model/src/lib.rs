//! Interframe Frame Model
//!
//! Defines the core data contracts shared by the decoder side, the
//! interpolation engine, and the encoder side:
//! - **Frames:** Geometry, shared pixel payload, and sequence metadata
//! - **Keys:** Deterministic identity strings used for caching
//! - **Motion:** Displacement estimates and regions of interest
//!
//! Pixel layout and color space are owned by the decoder; this crate only
//! tracks geometry (width, height, line stride, bytes per pixel).

pub mod frame;
pub mod key;
pub mod motion;

pub use frame::*;
pub use key::*;
pub use motion::*;

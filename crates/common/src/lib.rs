//! Interframe Common Utilities
//!
//! Shared infrastructure for all Interframe crates:
//! - Error types and result aliases
//! - Timestamp conversions between millisecond and microsecond resolution
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;

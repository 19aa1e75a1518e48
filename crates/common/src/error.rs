//! Error types shared across Interframe crates.

/// Top-level error type for Interframe operations.
///
/// Only precondition violations and infrastructure failures live here.
/// A declined motion estimate and a cache miss are ordinary outcomes and
/// are reported through `ImageMotion::valid` and `Option` respectively.
#[derive(Debug, thiserror::Error)]
pub enum InterframeError {
    #[error(
        "Frame geometry mismatch: expected {expected_width}x{expected_height} \
         (stride {expected_stride}), got {actual_width}x{actual_height} (stride {actual_stride})"
    )]
    GeometryMismatch {
        expected_width: u32,
        expected_height: u32,
        expected_stride: usize,
        actual_width: u32,
        actual_height: u32,
        actual_stride: usize,
    },

    #[error("Interpolation fraction {value} is outside [0, 1]")]
    InvalidFraction { value: f64 },

    #[error("Processing error: {message}")]
    Processing { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using InterframeError.
pub type InterframeResult<T> = Result<T, InterframeError>;

impl InterframeError {
    pub fn invalid_fraction(value: f64) -> Self {
        Self::InvalidFraction { value }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error rejects the caller's request itself, as opposed
    /// to an environment failure.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::GeometryMismatch { .. } | Self::InvalidFraction { .. }
        )
    }
}

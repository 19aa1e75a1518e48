//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{InterframeError, InterframeResult};

/// Largest accepted motion search range, in pixels.
pub const MAX_SEARCH_RANGE: u32 = 256;

/// Largest accepted sampling step, in pixels.
pub const MAX_SAMPLE_STEP: u32 = 64;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default interpolation settings.
    #[serde(default)]
    pub interpolation: InterpolationDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default tunables for motion estimation, sharpening, and caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationDefaults {
    /// Search window half-size in pixels on either side of zero motion.
    pub search_range: u32,

    /// Sample every Nth pixel of the region when scoring candidates.
    pub sample_step: u32,

    /// Minimum mean absolute luma gradient for the region to be trackable.
    pub min_texture: f64,

    /// Maximum mean absolute luma difference accepted as a match.
    pub max_match_cost: f64,

    /// Required lead of the best match over distant candidates, relative
    /// to `max(best_cost, 1)`.
    pub ambiguity_margin: f64,

    /// Refine the best integer offset with a parabolic fit.
    pub subpixel: bool,

    /// Unsharp-mask strength (0 disables sharpening).
    pub sharpen_strength: f32,

    /// Number of frames held by the frame cache.
    pub cache_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "interframe=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interpolation: InterpolationDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for InterpolationDefaults {
    fn default() -> Self {
        Self {
            search_range: 16,
            sample_step: 2,
            min_texture: 1.0,
            max_match_cost: 24.0,
            ambiguity_margin: 0.5,
            subpixel: true,
            sharpen_strength: 0.5,
            cache_capacity: 32,
        }
    }
}

impl InterpolationDefaults {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> InterframeResult<()> {
        if self.search_range > MAX_SEARCH_RANGE {
            return Err(InterframeError::config(format!(
                "search_range {} exceeds {MAX_SEARCH_RANGE}",
                self.search_range
            )));
        }
        if !(1..=MAX_SAMPLE_STEP).contains(&self.sample_step) {
            return Err(InterframeError::config(format!(
                "sample_step {} outside 1..={MAX_SAMPLE_STEP}",
                self.sample_step
            )));
        }
        let thresholds = [
            ("min_texture", self.min_texture),
            ("max_match_cost", self.max_match_cost),
            ("ambiguity_margin", self.ambiguity_margin),
            ("sharpen_strength", self.sharpen_strength as f64),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(InterframeError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.cache_capacity == 0 {
            return Err(InterframeError::config("cache_capacity must be at least 1"));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                    Ok(config) => match config.interpolation.validate() {
                        Ok(()) => return config,
                        Err(e) => {
                            tracing::warn!("Rejected config at {:?}: {}", config_path, e);
                        }
                    },
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("interframe").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("interframe-config-{}-{name}", std::process::id()))
            .join("config.json")
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"interpolation":{"search_range":8}}"#).unwrap();
        assert_eq!(config.interpolation.search_range, 8);
        assert_eq!(config.interpolation.cache_capacity, 32);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path("roundtrip");
        let mut config = AppConfig::default();
        config.interpolation.sharpen_strength = 0.0;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.interpolation.sharpen_strength, 0.0);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let mut defaults = InterpolationDefaults::default();
        assert!(defaults.validate().is_ok());

        defaults.search_range = u32::MAX;
        let err = defaults.validate().unwrap_err();
        assert!(matches!(err, InterframeError::Config { .. }));

        let mut defaults = InterpolationDefaults::default();
        defaults.sample_step = 0;
        assert!(defaults.validate().is_err());

        let mut defaults = InterpolationDefaults::default();
        defaults.max_match_cost = f64::NAN;
        assert!(defaults.validate().is_err());
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let path = scratch_path("huge-range");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"interpolation":{"search_range":4000000000}}"#).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.interpolation.search_range, 16);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_unparseable_config_falls_back() {
        let path = scratch_path("garbage");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.interpolation.search_range, 16);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}

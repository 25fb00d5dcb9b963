//! Shared configuration for inkline
//!
//! This crate provides the single source of truth for canvas dimensions,
//! curve smoothing density and the application identity written into
//! exported documents.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default canvas width in points
pub const DEFAULT_WIDTH: u32 = 1024;

/// Default canvas height in points
pub const DEFAULT_HEIGHT: u32 = 768;

/// Default number of smoothed samples produced per incoming raw point
pub const DEFAULT_SMOOTHING_SAMPLES: usize = 12;

/// Smallest accepted smoothing density
pub const MIN_SMOOTHING_SAMPLES: usize = 2;

/// Largest accepted smoothing density
pub const MAX_SMOOTHING_SAMPLES: usize = 64;

/// Environment variable overriding [`CanvasConfig::smoothing_samples`]
pub const ENV_SMOOTHING_SAMPLES: &str = "INKLINE_SMOOTHING_SAMPLES";

/// Environment variable overriding [`CanvasConfig::canvas_size`], formatted `WIDTHxHEIGHT`
pub const ENV_CANVAS_SIZE: &str = "INKLINE_CANVAS_SIZE";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Identity of the application embedding the canvas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub name: String,
    pub version: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            name: "inkline".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Canvas configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas size in document points `[width, height]`
    pub canvas_size: [u32; 2],
    /// Smoothed samples emitted per raw input point
    pub smoothing_samples: usize,
    /// Application identity recorded in exported documents
    pub app: AppIdentity,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            canvas_size: [DEFAULT_WIDTH, DEFAULT_HEIGHT],
            smoothing_samples: DEFAULT_SMOOTHING_SAMPLES,
            app: AppIdentity::default(),
        }
    }
}

impl CanvasConfig {
    /// Create a config with the given canvas dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas_size: [width, height],
            ..Default::default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Read and parse a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Apply `INKLINE_SMOOTHING_SAMPLES` and `INKLINE_CANVAS_SIZE` on top of this config
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(
            std::env::var(ENV_SMOOTHING_SAMPLES).ok().as_deref(),
            std::env::var(ENV_CANVAS_SIZE).ok().as_deref(),
        )
    }

    fn with_overrides(
        mut self,
        samples: Option<&str>,
        size: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = samples {
            self.smoothing_samples = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_SMOOTHING_SAMPLES,
                value: raw.to_string(),
            })?;
        }
        if let Some(raw) = size {
            self.canvas_size = parse_size(raw).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_CANVAS_SIZE,
                value: raw.to_string(),
            })?;
        }
        Ok(self.normalized())
    }

    /// Clamp values into their accepted ranges
    pub fn normalized(mut self) -> Self {
        self.smoothing_samples = self
            .smoothing_samples
            .clamp(MIN_SMOOTHING_SAMPLES, MAX_SMOOTHING_SAMPLES);
        self
    }

    /// Get width as f32 for calculations
    pub fn width_f32(&self) -> f32 {
        self.canvas_size[0] as f32
    }

    /// Get height as f32 for calculations
    pub fn height_f32(&self) -> f32 {
        self.canvas_size[1] as f32
    }
}

fn parse_size(raw: &str) -> Option<[u32; 2]> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    Some([w.trim().parse().ok()?, h.trim().parse().ok()?])
}

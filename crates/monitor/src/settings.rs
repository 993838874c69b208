//! Layered monitor configuration
//!
//! Defaults, then an optional config file, then `DROWSY_` environment
//! variables (`__` separates sections, e.g. `DROWSY_ALARM__PORT`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::Level;

use alerting::AlarmConfig;
use camera_capture::CameraConfig;
use dms::DmsConfig;

use crate::MonitorError;

const ENV_PREFIX: &str = "DROWSY";

/// Video input settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Flip frames horizontally before landmark detection
    pub mirror: bool,
    /// Frame rate of image sequences
    pub fps: f64,
    /// Resize frames to this width (0 = keep)
    pub width: u32,
    /// Resize frames to this height (0 = keep)
    pub height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            mirror: true,
            fps: 30.0,
            width: 0,
            height: 0,
        }
    }
}

impl VideoConfig {
    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<Level, MonitorError> {
        self.level
            .parse()
            .map_err(|_| MonitorError::Config(format!("invalid log level '{}'", self.level)))
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub dms: DmsConfig,
    pub alarm: AlarmConfig,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load from an optional file and the process environment.
    ///
    /// Values are not validated here; call [`MonitorConfig::validate`] once
    /// command-line overrides have been applied.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, MonitorError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        self.dms.validate()?;
        self.logging.max_level()?;
        if !self.video.fps.is_finite() || self.video.fps <= 0.0 {
            return Err(MonitorError::Config(format!(
                "video.fps must be positive, got {}",
                self.video.fps
            )));
        }
        Ok(())
    }
}

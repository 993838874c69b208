//! Drowsiness Monitor
//!
//! Frame loop that turns landmarks into alarm commands: acquire a frame,
//! detect landmarks, score eye openness, advance the drowsiness state,
//! actuate the alarm, render, then poll for quit.

pub mod overlay;
pub mod replay;
pub mod session;
pub mod settings;

pub use overlay::{annotate, FrameDumpOverlay, LogOverlay, OverlaySink};
pub use replay::{load_trace, parse_trace, LandmarkTrace};
pub use session::{MonitorSession, QuitSignal, SessionEnd, SessionSummary};
pub use settings::{LoggingConfig, MonitorConfig, VideoConfig};

use camera_capture::CameraError;
use dms::DmsError;
use thiserror::Error;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),

    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error("Frame acquisition failed: {0}")]
    Capture(#[from] CameraError),

    #[error("Invalid trace at line {line}: {reason}")]
    Trace { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), MonitorError> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.max_level()?)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| MonitorError::Logging(e.to_string()))
}

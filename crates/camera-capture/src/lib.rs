//! Camera Capture Library for the Drowsiness Monitor
//!
//! Provides the frame type consumed by the monitor and the sources that
//! produce frames. Supports:
//! - Image sequences on disk (one file per frame)
//! - In-memory sources for replay and tests

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameSource, ImageDirSource, VecFrameSource};

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Failed to decode frame {sequence}: {reason}")]
    Decode { sequence: u32, reason: String },

    #[error("Invalid frame rate: {0}")]
    InvalidFps(f64),

    #[error("Frame source exhausted")]
    EndOfStream,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CameraError {
    /// Whether the source simply ran out of frames (orderly end of a session)
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, CameraError::EndOfStream)
    }
}

/// Frame source configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Capture width hint (0 = keep source size)
    pub width: u32,
    /// Capture height hint (0 = keep source size)
    pub height: u32,
    /// Frames per second used to derive timestamps
    pub fps: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fps: 30.0,
        }
    }
}

impl CameraConfig {
    /// Nanoseconds between consecutive frames
    pub fn frame_interval_ns(&self) -> Result<u64, CameraError> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(CameraError::InvalidFps(self.fps));
        }
        Ok((1_000_000_000.0 / self.fps).round() as u64)
    }
}

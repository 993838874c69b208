//! Alarm transport error types

use thiserror::Error;

/// Errors from the alarm transport. None of these stop monitoring.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No device configured or the connection never came up
    #[error("Alarm device unavailable")]
    Unavailable,

    /// Opening the serial port failed
    #[error("Failed to open {port}: {reason}")]
    Open { port: String, reason: String },

    /// Writing a command failed
    #[error("Write failed: {0}")]
    Write(String),

    /// Writing a command took longer than the write timeout
    #[error("Write timed out after {0}ms")]
    Timeout(u64),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Write(err.to_string())
    }
}

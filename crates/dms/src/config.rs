//! DMS configuration

use serde::{Deserialize, Serialize};

use crate::landmarks::EyeIndices;
use crate::DmsError;

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Openness score below which the eyes count as closed
    pub eye_closed_threshold: f32,

    /// How long the eyes must stay closed before the alarm is raised (seconds)
    pub sleep_duration_seconds: f64,

    /// Six-point contour of the left eye
    pub left_eye_indices: EyeIndices,

    /// Six-point contour of the right eye
    pub right_eye_indices: EyeIndices,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            eye_closed_threshold: 0.21,
            sleep_duration_seconds: 3.0,
            left_eye_indices: EyeIndices::LEFT,
            right_eye_indices: EyeIndices::RIGHT,
        }
    }
}

impl DmsConfig {
    /// Create strict config (alarm sooner)
    pub fn strict() -> Self {
        Self {
            sleep_duration_seconds: 2.0,
            ..Default::default()
        }
    }

    /// Create lenient config (alarm later)
    pub fn lenient() -> Self {
        Self {
            sleep_duration_seconds: 5.0,
            ..Default::default()
        }
    }

    /// Reject thresholds the state machine cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        if !self.eye_closed_threshold.is_finite() || self.eye_closed_threshold <= 0.0 {
            return Err(DmsError::Config(format!(
                "eye_closed_threshold must be a positive number, got {}",
                self.eye_closed_threshold
            )));
        }
        if !self.sleep_duration_seconds.is_finite() || self.sleep_duration_seconds <= 0.0 {
            return Err(DmsError::Config(format!(
                "sleep_duration_seconds must be a positive number, got {}",
                self.sleep_duration_seconds
            )));
        }
        Ok(())
    }
}

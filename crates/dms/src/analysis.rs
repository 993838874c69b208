//! DMS analysis results

use serde::{Deserialize, Serialize};

use crate::eye::EyeOpenness;
use crate::state::{AlarmTransition, DrowsinessStatus};

/// Display colour of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusColor {
    Green,
    Yellow,
    Red,
}

impl StatusColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            StatusColor::Green => [0, 255, 0],
            StatusColor::Yellow => [255, 255, 0],
            StatusColor::Red => [255, 0, 0],
        }
    }
}

/// Complete per-frame DMS analysis result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Whether a face was detected
    pub face_detected: bool,

    /// Eye openness (if a face was detected)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openness: Option<EyeOpenness>,

    /// Drowsiness classification (if the state machine was advanced)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DrowsinessStatus>,

    /// Alarm change decided on this frame
    pub transition: AlarmTransition,
}

impl DmsAnalysis {
    /// Result for a frame without a face; the state machine is not advanced
    pub fn no_face() -> Self {
        Self::default()
    }

    /// Status line shown on the overlay
    pub fn status_text(&self) -> String {
        match self.status.unwrap_or_default() {
            DrowsinessStatus::Awake => "Status: Awake".to_string(),
            DrowsinessStatus::Closing(elapsed) => {
                format!("Closing: {:.1}s", elapsed.as_secs_f64())
            }
            DrowsinessStatus::Sleeping => "!!! SLEEPING !!!".to_string(),
        }
    }

    /// EAR line shown on the overlay
    pub fn ear_text(&self) -> Option<String> {
        self.openness.map(|o| format!("EAR: {:.2}", o.score))
    }

    pub fn status_color(&self) -> StatusColor {
        match self.status.unwrap_or_default() {
            DrowsinessStatus::Awake => StatusColor::Green,
            DrowsinessStatus::Closing(_) => StatusColor::Yellow,
            DrowsinessStatus::Sleeping => StatusColor::Red,
        }
    }
}

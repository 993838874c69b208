//! Driver Monitoring System (DMS)
//!
//! Real-time drowsiness analysis from facial landmarks:
//! - Eye aspect ratio (EAR) per eye and per frame
//! - Debounced eye-closure tracking
//! - Latched, edge-triggered alarm decisions

pub mod analysis;
pub mod config;
pub mod detector;
pub mod eye;
pub mod landmarks;
pub mod state;

pub use analysis::{DmsAnalysis, StatusColor};
pub use config::DmsConfig;
pub use detector::{LandmarkProvider, RecordedLandmarks};
pub use eye::{estimate_openness, eye_aspect_ratio, EyeOpenness};
pub use landmarks::{EyeIndices, Landmark, LandmarkSet};
pub use state::{AlarmTransition, DrowsinessState, DrowsinessStatus};

#[cfg(feature = "onnx")]
pub use detector::{FaceMeshConfig, FaceMeshDetector};

use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Landmark {0} missing for eye measurement")]
    KeypointsMissing(usize),
}

/// Driver monitoring module
///
/// Owns the drowsiness state for one session and advances it once per frame
/// that has a face.
pub struct DmsModule {
    config: DmsConfig,
    state: DrowsinessState,
}

impl DmsModule {
    /// Create a new DMS module with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            config,
            state: DrowsinessState::default(),
        })
    }

    /// Analyze the landmarks of one frame.
    ///
    /// `None` landmarks (no face) leave the state untouched. A landmark set
    /// missing a referenced id is rejected before the state is touched.
    pub fn analyze(
        &mut self,
        landmarks: Option<&LandmarkSet>,
        width: u32,
        height: u32,
        now: Instant,
    ) -> Result<DmsAnalysis, DmsError> {
        let Some(landmarks) = landmarks else {
            return Ok(DmsAnalysis::no_face());
        };

        let openness = estimate_openness(&self.config, landmarks, width, height)?;
        let (status, transition) = self.state.tick(openness.score, now, &self.config);

        debug!(
            "EAR {:.3} (L {:.3} R {:.3}) -> {:?} {:?}",
            openness.score, openness.left, openness.right, status, transition
        );

        Ok(DmsAnalysis {
            face_detected: true,
            openness: Some(openness),
            status: Some(status),
            transition,
        })
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn state(&self) -> &DrowsinessState {
        &self.state
    }
}

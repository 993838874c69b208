//! Facial landmark providers

use std::collections::HashMap;

use camera_capture::frame::VideoFrame;
use tracing::debug;

use crate::landmarks::LandmarkSet;
use crate::DmsError;

/// Produces the landmarks of the first face in a frame.
///
/// `Ok(None)` means no face was found, which is a normal outcome.
pub trait LandmarkProvider {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, DmsError>;
}

/// Landmarks recorded ahead of time, keyed by frame sequence number
#[derive(Debug, Clone, Default)]
pub struct RecordedLandmarks {
    by_sequence: HashMap<u32, LandmarkSet>,
}

impl RecordedLandmarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record landmarks for a frame; frames never recorded have no face
    pub fn insert(&mut self, sequence: u32, landmarks: LandmarkSet) {
        self.by_sequence.insert(sequence, landmarks);
    }

    pub fn len(&self) -> usize {
        self.by_sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sequence.is_empty()
    }
}

impl LandmarkProvider for RecordedLandmarks {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, DmsError> {
        let found = self.by_sequence.remove(&frame.sequence);
        if found.is_none() {
            debug!("No recorded face for frame {}", frame.sequence);
        }
        Ok(found)
    }
}

#[cfg(feature = "onnx")]
pub use face_mesh::{FaceMeshConfig, FaceMeshDetector};

#[cfg(feature = "onnx")]
mod face_mesh {
    use super::*;
    use crate::landmarks::Landmark;
    use ndarray::Array4;
    use ort::session::{builder::GraphOptimizationLevel, Session};
    use tracing::{error, info};

    /// Side length of the face-mesh model input
    const INPUT_SIZE: u32 = 192;

    /// Face-mesh model settings
    #[derive(Debug, Clone)]
    pub struct FaceMeshConfig {
        /// Path to the ONNX model
        pub model_path: String,
        /// Minimum face presence probability
        pub face_confidence: f32,
    }

    impl Default for FaceMeshConfig {
        fn default() -> Self {
            Self {
                model_path: "face_landmark.onnx".to_string(),
                face_confidence: 0.5,
            }
        }
    }

    /// Face-mesh landmark model.
    ///
    /// Expects a 1x3x192x192 RGB input in [0, 1]. Output 0 holds x, y, z
    /// triples in input pixels, output 1 the face presence logit. The whole
    /// frame is treated as the face crop.
    pub struct FaceMeshDetector {
        face_confidence: f32,
        session: Session,
    }

    impl FaceMeshDetector {
        pub fn new(config: &FaceMeshConfig) -> Result<Self, DmsError> {
            info!("Loading face mesh model from {}", config.model_path);

            let session = Session::builder()
                .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
                .and_then(|b| b.commit_from_file(&config.model_path))
                .map_err(|e| {
                    error!("Failed to load face mesh model: {}", e);
                    DmsError::ModelLoad(e.to_string())
                })?;

            Ok(Self {
                face_confidence: config.face_confidence,
                session,
            })
        }
    }

    impl LandmarkProvider for FaceMeshDetector {
        fn detect(&mut self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, DmsError> {
            let img = frame
                .to_rgb_image()
                .ok_or_else(|| DmsError::ImageProcessing("frame has no pixel data".into()))?;

            let resized = image::imageops::resize(
                &img,
                INPUT_SIZE,
                INPUT_SIZE,
                image::imageops::FilterType::Triangle,
            );

            let side = INPUT_SIZE as usize;
            let mut input_array = Array4::<f32>::zeros((1, 3, side, side));
            for (x, y, pixel) in resized.enumerate_pixels() {
                for c in 0..3 {
                    input_array[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
                }
            }

            let outputs = self
                .session
                .run(ort::inputs![input_array].map_err(|e| DmsError::Inference(e.to_string()))?)
                .map_err(|e| DmsError::Inference(e.to_string()))?;

            let presence = outputs[1]
                .try_extract_tensor::<f32>()
                .map_err(|e| DmsError::Inference(e.to_string()))?;
            let logit = presence.iter().next().copied().unwrap_or(f32::NEG_INFINITY);
            let probability = 1.0 / (1.0 + (-logit).exp());
            if probability < self.face_confidence {
                return Ok(None);
            }

            let coords = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| DmsError::Inference(e.to_string()))?;
            let coords: Vec<f32> = coords.iter().copied().collect();

            let scale = INPUT_SIZE as f32;
            let points = coords
                .chunks_exact(3)
                .map(|p| Landmark::new(p[0] / scale, p[1] / scale))
                .collect();

            Ok(Some(LandmarkSet::new(points)))
        }
    }
}

//! Eye aspect ratio (EAR) estimation from facial landmarks

use serde::{Deserialize, Serialize};

use crate::landmarks::{EyeIndices, LandmarkSet};
use crate::{DmsConfig, DmsError};

/// Per-frame eye openness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeOpenness {
    /// Left eye EAR
    pub left: f32,
    /// Right eye EAR
    pub right: f32,
    /// Mean of both eyes, the score fed to the state machine
    pub score: f32,
}

/// Eye aspect ratio of one eye.
///
/// Vertical distance between positions 1 and 5 over horizontal distance
/// between positions 0 and 3, measured on truncated pixel coordinates. A zero
/// horizontal distance yields 0.0 (fully closed).
pub fn eye_aspect_ratio(
    eye: &EyeIndices,
    landmarks: &LandmarkSet,
    width: u32,
    height: u32,
) -> Result<f32, DmsError> {
    let pixel = |id: usize| {
        landmarks
            .get(id)
            .map(|lm| lm.to_pixel(width, height))
            .ok_or(DmsError::KeypointsMissing(id))
    };

    let (top, bottom) = eye.vertical_pair();
    let (outer, inner) = eye.horizontal_pair();

    let vertical = (pixel(top)?.1 - pixel(bottom)?.1).abs();
    let horizontal = (pixel(outer)?.0 - pixel(inner)?.0).abs();

    if horizontal == 0 {
        return Ok(0.0);
    }
    Ok(vertical as f32 / horizontal as f32)
}

/// Openness of both eyes and their mean
pub fn estimate_openness(
    config: &DmsConfig,
    landmarks: &LandmarkSet,
    width: u32,
    height: u32,
) -> Result<EyeOpenness, DmsError> {
    let left = eye_aspect_ratio(&config.left_eye_indices, landmarks, width, height)?;
    let right = eye_aspect_ratio(&config.right_eye_indices, landmarks, width, height)?;

    Ok(EyeOpenness {
        left,
        right,
        score: (left + right) / 2.0,
    })
}

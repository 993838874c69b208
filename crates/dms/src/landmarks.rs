//! Facial landmark types

use serde::{Deserialize, Serialize};

/// A normalized 2D landmark position (x, y in [0, 1] of the frame)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Map to integer pixel coordinates, truncating toward zero
    pub fn to_pixel(self, width: u32, height: u32) -> (i32, i32) {
        ((self.x * width as f32) as i32, (self.y * height as f32) as i32)
    }
}

/// Landmarks of the first detected face, indexed by landmark id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Build from `(x, y)` pairs, the layout landmark recordings use
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = [f32; 2]>,
    {
        Self {
            points: pairs.into_iter().map(|[x, y]| Landmark::new(x, y)).collect(),
        }
    }

    pub fn get(&self, id: usize) -> Option<Landmark> {
        self.points.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The six contour landmarks of one eye.
///
/// Positions 1 and 5 are the vertical pair, positions 0 and 3 the horizontal
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EyeIndices([usize; 6]);

impl EyeIndices {
    /// Face-mesh contour of the left eye
    pub const LEFT: EyeIndices = EyeIndices([33, 160, 158, 133, 153, 144]);
    /// Face-mesh contour of the right eye
    pub const RIGHT: EyeIndices = EyeIndices([362, 385, 387, 263, 373, 380]);

    pub const fn new(ids: [usize; 6]) -> Self {
        Self(ids)
    }

    pub fn as_array(&self) -> &[usize; 6] {
        &self.0
    }

    /// Landmark ids of the vertical measurement pair
    pub fn vertical_pair(&self) -> (usize, usize) {
        (self.0[1], self.0[5])
    }

    /// Landmark ids of the horizontal measurement pair
    pub fn horizontal_pair(&self) -> (usize, usize) {
        (self.0[0], self.0[3])
    }
}

//! Video frame types and processing

use image::RgbImage;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3), empty for metadata-only frames
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Monotonic capture timestamp since the start of the source (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Frame that carries geometry and timing but no pixels.
    ///
    /// Used when landmarks come from a recording rather than from the image.
    pub fn metadata_only(width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self::new(Vec::new(), width, height, timestamp_ns, sequence)
    }

    /// Build a frame from a decoded image
    pub fn from_image(img: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Whether the pixel buffer matches the frame geometry
    pub fn has_pixels(&self) -> bool {
        !self.data.is_empty() && self.data.len() == (self.width * self.height * 3) as usize
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if !self.has_pixels() || x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Flip the frame horizontally in place (selfie view)
    pub fn mirror(&mut self) {
        if !self.has_pixels() {
            return;
        }
        let row_len = (self.width * 3) as usize;
        for row in self.data.chunks_exact_mut(row_len) {
            let (mut left, mut right) = (0usize, self.width as usize - 1);
            while left < right {
                for c in 0..3 {
                    row.swap(left * 3 + c, right * 3 + c);
                }
                left += 1;
                right -= 1;
            }
        }
    }

    /// Copy the pixels into an `image` buffer
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if !self.has_pixels() {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }
}

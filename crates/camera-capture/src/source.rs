//! Frame sources

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{CameraConfig, CameraError, VideoFrame};

/// File extensions decoded by [`ImageDirSource`]
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// A blocking producer of video frames.
///
/// `next_frame` may block on hardware or disk I/O. Returning
/// [`CameraError::EndOfStream`] means the source is done; any other error is a
/// capture failure.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<VideoFrame, CameraError>;
}

/// Reads an ordered sequence of image files from a directory
pub struct ImageDirSource {
    files: VecDeque<PathBuf>,
    interval_ns: u64,
    target_size: Option<(u32, u32)>,
    sequence: u32,
}

impl ImageDirSource {
    /// Open a directory of frames, sorted by file name
    pub fn open(dir: impl AsRef<Path>, config: &CameraConfig) -> Result<Self, CameraError> {
        let dir = dir.as_ref();
        let interval_ns = config.frame_interval_ns()?;

        let entries = std::fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(CameraError::Open(format!(
                "no image files in {}",
                dir.display()
            )));
        }

        info!("Opened image source {} ({} frames)", dir.display(), files.len());

        let target_size = (config.width > 0 && config.height > 0).then_some((config.width, config.height));

        Ok(Self {
            files: files.into(),
            interval_ns,
            target_size,
            sequence: 0,
        })
    }

    /// Frames left in the directory
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<VideoFrame, CameraError> {
        let path = self.files.pop_front().ok_or(CameraError::EndOfStream)?;
        let sequence = self.sequence;
        self.sequence += 1;

        debug!("Decoding frame {} from {}", sequence, path.display());

        let img = image::open(&path).map_err(|e| CameraError::Decode {
            sequence,
            reason: e.to_string(),
        })?;

        let rgb = match self.target_size {
            Some((w, h)) if img.width() != w || img.height() != h => {
                image::imageops::resize(&img.to_rgb8(), w, h, image::imageops::FilterType::Triangle)
            }
            _ => img.to_rgb8(),
        };

        let timestamp_ns = sequence as u64 * self.interval_ns;
        Ok(VideoFrame::from_image(rgb, timestamp_ns, sequence))
    }
}

/// In-memory frame source, yields frames in order then ends
#[derive(Debug, Default)]
pub struct VecFrameSource {
    frames: VecDeque<VideoFrame>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> Result<VideoFrame, CameraError> {
        self.frames.pop_front().ok_or(CameraError::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_image_dir_source_orders_and_ends() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]))
            .save(dir.path().join("frame_001.png"))
            .unwrap();
        RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]))
            .save(dir.path().join("frame_000.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageDirSource::open(dir.path(), &CameraConfig::default()).unwrap();
        assert_eq!(source.remaining(), 2);

        let first = source.next_frame().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.timestamp_ns, 0);
        assert_eq!(first.get_pixel(0, 0), Some([255, 0, 0]));

        let second = source.next_frame().unwrap();
        assert_eq!(second.sequence, 1);
        assert_eq!(second.timestamp_ns, 33_333_333);

        assert!(source.next_frame().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_image_dir_source_resizes() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]))
            .save(dir.path().join("a.png"))
            .unwrap();

        let config = CameraConfig {
            width: 4,
            height: 2,
            ..Default::default()
        };
        let mut source = ImageDirSource::open(dir.path(), &config).unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let mut source = ImageDirSource::open(dir.path(), &CameraConfig::default()).unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, CameraError::Decode { sequence: 0, .. }));
        assert!(!err.is_end_of_stream());
    }

    #[test]
    fn test_empty_dir_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ImageDirSource::open(dir.path(), &CameraConfig::default()),
            Err(CameraError::Open(_))
        ));
    }

    #[test]
    fn test_vec_source() {
        let mut source = VecFrameSource::new(vec![VideoFrame::metadata_only(1, 1, 0, 0)]);
        assert!(source.next_frame().is_ok());
        assert!(source.next_frame().unwrap_err().is_end_of_stream());
    }
}

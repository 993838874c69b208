//! Frame overlay rendering

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::mem::discriminant;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use camera_capture::VideoFrame;
use dms::{DmsAnalysis, DrowsinessStatus};

/// Height of the status banner in pixels
const BANNER_HEIGHT: u32 = 24;
/// Height of the EAR gauge under the banner
const GAUGE_HEIGHT: u32 = 6;
/// EAR shown as a full gauge
const GAUGE_FULL_SCALE: f32 = 0.5;

/// Receives every processed frame with its analysis
pub trait OverlaySink {
    fn render(&mut self, frame: &VideoFrame, analysis: &DmsAnalysis);
}

impl OverlaySink for Vec<Box<dyn OverlaySink>> {
    fn render(&mut self, frame: &VideoFrame, analysis: &DmsAnalysis) {
        for sink in self.iter_mut() {
            sink.render(frame, analysis);
        }
    }
}

/// Writes the overlay text to the log.
///
/// Every frame with a face at debug level, status class changes at info.
#[derive(Debug, Default)]
pub struct LogOverlay {
    last_status: Option<DrowsinessStatus>,
}

impl LogOverlay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OverlaySink for LogOverlay {
    fn render(&mut self, frame: &VideoFrame, analysis: &DmsAnalysis) {
        let Some(status) = analysis.status else {
            return;
        };
        let ear = analysis.ear_text().unwrap_or_default();
        debug!("frame {}: {} | {}", frame.sequence, ear, analysis.status_text());

        let changed = self
            .last_status
            .map(|last| discriminant(&last) != discriminant(&status))
            .unwrap_or(true);
        if changed {
            info!("{} ({})", analysis.status_text(), ear);
        }
        self.last_status = Some(status);
    }
}

/// Draw the status banner and EAR gauge onto a copy of the frame.
///
/// The banner carries the status colour and the gauge the EAR; the overlay
/// texts themselves are written by [`LogOverlay`]. Returns `None` for frames
/// without pixels. Frames without a face are returned unannotated.
pub fn annotate(frame: &VideoFrame, analysis: &DmsAnalysis) -> Option<RgbImage> {
    let mut img = frame.to_rgb_image()?;
    if !analysis.face_detected {
        return Some(img);
    }

    let (width, height) = img.dimensions();
    let banner = BANNER_HEIGHT.min(height);
    draw_filled_rect_mut(
        &mut img,
        Rect::at(0, 0).of_size(width, banner.max(1)),
        Rgb(analysis.status_color().rgb()),
    );

    if let Some(openness) = analysis.openness {
        let fraction = (openness.score / GAUGE_FULL_SCALE).clamp(0.0, 1.0);
        let gauge_width = (fraction * width as f32) as u32;
        let gauge_top = banner;
        if gauge_width > 0 && gauge_top < height {
            let gauge_height = GAUGE_HEIGHT.min(height - gauge_top);
            draw_filled_rect_mut(
                &mut img,
                Rect::at(0, gauge_top as i32).of_size(gauge_width, gauge_height),
                Rgb([255, 255, 255]),
            );
        }
    }

    Some(img)
}

/// Saves annotated frames as PNG files
pub struct FrameDumpOverlay {
    dir: PathBuf,
    every: u32,
}

impl FrameDumpOverlay {
    /// Dump every `every`-th frame into `dir` (created if missing)
    pub fn new(dir: impl Into<PathBuf>, every: u32) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            every: every.max(1),
        })
    }
}

impl OverlaySink for FrameDumpOverlay {
    fn render(&mut self, frame: &VideoFrame, analysis: &DmsAnalysis) {
        if frame.sequence % self.every != 0 {
            return;
        }
        let Some(img) = annotate(frame, analysis) else {
            return;
        };
        let path = self.dir.join(format!("frame_{:06}.png", frame.sequence));
        if let Err(e) = img.save(&path) {
            warn!("Failed to write overlay frame {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dms::{AlarmTransition, EyeOpenness};
    use std::time::Duration;

    fn frame(width: u32, height: u32, sequence: u32) -> VideoFrame {
        VideoFrame::new(vec![0; (width * height * 3) as usize], width, height, 0, sequence)
    }

    fn analysis(status: DrowsinessStatus, score: f32) -> DmsAnalysis {
        DmsAnalysis {
            face_detected: true,
            openness: Some(EyeOpenness {
                left: score,
                right: score,
                score,
            }),
            status: Some(status),
            transition: AlarmTransition::NoChange,
        }
    }

    #[test]
    fn test_annotate_banner_color_and_gauge() {
        let img = annotate(&frame(100, 50, 0), &analysis(DrowsinessStatus::Sleeping, 0.25)).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(img.get_pixel(99, 23), &Rgb([255, 0, 0]));
        // Gauge half full
        assert_eq!(img.get_pixel(10, 26), &Rgb([255, 255, 255]));
        assert_eq!(img.get_pixel(60, 26), &Rgb([0, 0, 0]));
        // Untouched below
        assert_eq!(img.get_pixel(50, 40), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_annotate_closing_is_yellow() {
        let img = annotate(
            &frame(10, 10, 0),
            &analysis(DrowsinessStatus::Closing(Duration::from_millis(500)), 0.1),
        )
        .unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgb([255, 255, 0]));
    }

    #[test]
    fn test_annotate_without_face_or_pixels() {
        let img = annotate(&frame(10, 10, 0), &DmsAnalysis::no_face()).unwrap();
        assert!(img.pixels().all(|p| p == &Rgb([0, 0, 0])));

        let empty = VideoFrame::metadata_only(10, 10, 0, 0);
        assert!(annotate(&empty, &analysis(DrowsinessStatus::Awake, 0.3)).is_none());
    }

    #[test]
    fn test_frame_dump_writes_every_nth() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FrameDumpOverlay::new(dir.path().join("frames"), 2).unwrap();
        for seq in 0..4 {
            sink.render(&frame(8, 8, seq), &analysis(DrowsinessStatus::Awake, 0.3));
        }
        let mut written: Vec<_> = std::fs::read_dir(dir.path().join("frames"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        written.sort();
        assert_eq!(written, vec!["frame_000000.png", "frame_000002.png"]);
    }

    #[test]
    fn test_log_overlay_tracks_status() {
        let mut sink = LogOverlay::new();
        sink.render(&frame(1, 1, 0), &DmsAnalysis::no_face());
        assert!(sink.last_status.is_none());
        sink.render(&frame(1, 1, 1), &analysis(DrowsinessStatus::Awake, 0.3));
        assert_eq!(sink.last_status, Some(DrowsinessStatus::Awake));
    }
}

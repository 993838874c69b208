//! Recorded landmark traces
//!
//! One JSON object per line:
//!
//! ```text
//! {"t_ms": 0, "width": 640, "height": 480, "landmarks": [[0.41, 0.38], ...]}
//! {"t_ms": 33, "width": 640, "height": 480, "landmarks": null}
//! ```
//!
//! `landmarks` is the first face's normalized points indexed by landmark id,
//! or null when no face was found. Blank lines and lines starting with `#`
//! are ignored.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use camera_capture::{VecFrameSource, VideoFrame};
use dms::{LandmarkSet, RecordedLandmarks};

use crate::MonitorError;

#[derive(Debug, Deserialize)]
struct TraceRecord {
    t_ms: u64,
    width: u32,
    height: u32,
    #[serde(default)]
    landmarks: Option<Vec<[f32; 2]>>,
}

/// A parsed trace: metadata-only frames plus the landmarks for each
#[derive(Debug)]
pub struct LandmarkTrace {
    frames: Vec<VideoFrame>,
    landmarks: RecordedLandmarks,
}

impl LandmarkTrace {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn face_count(&self) -> usize {
        self.landmarks.len()
    }

    /// Split into a frame source and the matching landmark provider
    pub fn into_parts(self) -> (VecFrameSource, RecordedLandmarks) {
        (VecFrameSource::new(self.frames), self.landmarks)
    }
}

/// Parse a trace from any line-oriented reader
pub fn parse_trace<R: BufRead>(reader: R) -> Result<LandmarkTrace, MonitorError> {
    let mut frames = Vec::new();
    let mut landmarks = RecordedLandmarks::new();
    let mut last_t_ms = 0u64;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let record: TraceRecord = serde_json::from_str(trimmed).map_err(|e| MonitorError::Trace {
            line: line_no,
            reason: e.to_string(),
        })?;

        if record.width == 0 || record.height == 0 {
            return Err(MonitorError::Trace {
                line: line_no,
                reason: "frame size must be non-zero".into(),
            });
        }
        if record.t_ms < last_t_ms {
            return Err(MonitorError::Trace {
                line: line_no,
                reason: format!("timestamp {} ms goes backwards (previous {} ms)", record.t_ms, last_t_ms),
            });
        }
        last_t_ms = record.t_ms;

        let timestamp_ns = record.t_ms.checked_mul(1_000_000).ok_or_else(|| MonitorError::Trace {
            line: line_no,
            reason: format!("timestamp {} ms out of range", record.t_ms),
        })?;

        let sequence = frames.len() as u32;
        frames.push(VideoFrame::metadata_only(
            record.width,
            record.height,
            timestamp_ns,
            sequence,
        ));
        if let Some(points) = record.landmarks {
            landmarks.insert(sequence, LandmarkSet::from_pairs(points));
        }
    }

    Ok(LandmarkTrace { frames, landmarks })
}

/// Load a trace file
pub fn load_trace(path: &Path) -> Result<LandmarkTrace, MonitorError> {
    let file = File::open(path)?;
    let trace = parse_trace(BufReader::new(file))?;
    info!(
        "Loaded trace {} ({} frames, {} with a face)",
        path.display(),
        trace.frame_count(),
        trace.face_count()
    );
    Ok(trace)
}

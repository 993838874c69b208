//! Monitoring session and frame loop

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use alerting::{AlarmBridge, AlarmTransport, BridgeStats};
use camera_capture::{FrameSource, VideoFrame};
use dms::{AlarmTransition, DmsAnalysis, DmsConfig, DmsModule, LandmarkProvider};

use crate::overlay::OverlaySink;
use crate::MonitorError;

/// Quit flag polled once per loop iteration
#[derive(Debug, Clone, Default)]
pub struct QuitSignal {
    flag: Arc<AtomicBool>,
}

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Trigger on Ctrl-C
    pub fn install_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Quit requested");
                    signal.trigger();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        });
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionEnd {
    /// Quit signal received
    Quit,
    /// Frame source ran out of frames
    SourceExhausted,
}

/// Session counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub frames_with_face: u64,
    /// Frames dropped because landmarks could not be used
    pub frames_skipped: u64,
    pub alarms_raised: u32,
    pub alarms_cleared: u32,
    pub alarm_device: BridgeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<SessionEnd>,
}

/// One monitoring session: drowsiness state plus the alarm device
pub struct MonitorSession<T> {
    dms: DmsModule,
    alarm: AlarmBridge<T>,
    mirror: bool,
    summary: SessionSummary,
}

impl<T: AlarmTransport> MonitorSession<T> {
    pub fn new(config: DmsConfig, alarm: AlarmBridge<T>, mirror: bool) -> Result<Self, MonitorError> {
        Ok(Self {
            dms: DmsModule::new(config)?,
            alarm,
            mirror,
            summary: SessionSummary::default(),
        })
    }

    pub fn dms(&self) -> &DmsModule {
        &self.dms
    }

    pub fn alarm(&self) -> &AlarmBridge<T> {
        &self.alarm
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            alarm_device: self.alarm.stats(),
            ..self.summary.clone()
        }
    }

    /// Run until the source ends, the quit signal fires or a frame cannot be
    /// acquired. The alarm is always commanded off before returning.
    pub async fn run(
        &mut self,
        source: &mut dyn FrameSource,
        provider: &mut dyn LandmarkProvider,
        overlay: &mut dyn OverlaySink,
        quit: &QuitSignal,
    ) -> Result<SessionSummary, MonitorError> {
        let epoch = Instant::now();
        info!(
            "Monitoring started (threshold {}, sleep after {}s, alarm device {})",
            self.dms.config().eye_closed_threshold,
            self.dms.config().sleep_duration_seconds,
            if self.alarm.is_available() { "connected" } else { "absent" }
        );

        let outcome = loop {
            let mut frame = match source.next_frame() {
                Ok(frame) => frame,
                Err(e) if e.is_end_of_stream() => break Ok(SessionEnd::SourceExhausted),
                Err(e) => {
                    error!("Frame acquisition failed: {}", e);
                    break Err(MonitorError::Capture(e));
                }
            };

            let analysis = self.process_frame(&mut frame, provider, epoch).await;
            overlay.render(&frame, &analysis);

            // Give the Ctrl-C listener a turn
            tokio::task::yield_now().await;
            if quit.is_triggered() {
                break Ok(SessionEnd::Quit);
            }
        };

        self.terminate().await;

        let end = outcome?;
        self.summary.end = Some(end);
        let summary = self.summary();
        info!(
            "Monitoring stopped ({:?}): {} frames, {} with face, {} skipped, {} alarms raised, {} cleared, {} device write failures",
            end,
            summary.frames_processed,
            summary.frames_with_face,
            summary.frames_skipped,
            summary.alarms_raised,
            summary.alarms_cleared,
            summary.alarm_device.write_failures
        );
        Ok(summary)
    }

    /// Process one frame: detect, score, advance state, actuate.
    ///
    /// Frames whose landmarks are unusable are reported as faceless and do
    /// not advance the drowsiness state.
    pub async fn process_frame(
        &mut self,
        frame: &mut VideoFrame,
        provider: &mut dyn LandmarkProvider,
        epoch: Instant,
    ) -> DmsAnalysis {
        self.summary.frames_processed += 1;

        if self.mirror {
            frame.mirror();
        }

        let landmarks = match provider.detect(frame) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                warn!("Landmark detection failed on frame {}: {}", frame.sequence, e);
                self.summary.frames_skipped += 1;
                return DmsAnalysis::no_face();
            }
        };

        let now = epoch + Duration::from_nanos(frame.timestamp_ns);
        let analysis = match self
            .dms
            .analyze(landmarks.as_ref(), frame.width, frame.height, now)
        {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Skipping frame {}: {}", frame.sequence, e);
                self.summary.frames_skipped += 1;
                return DmsAnalysis::no_face();
            }
        };

        if analysis.face_detected {
            self.summary.frames_with_face += 1;
        }
        match analysis.transition {
            AlarmTransition::AlarmOn => self.summary.alarms_raised += 1,
            AlarmTransition::AlarmOff => self.summary.alarms_cleared += 1,
            AlarmTransition::NoChange => {}
        }

        self.alarm.apply(analysis.transition).await;
        analysis
    }

    /// Command the alarm off and release the device. Safe to call repeatedly.
    pub async fn terminate(&mut self) {
        self.alarm.shutdown().await;
    }
}

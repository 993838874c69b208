//! Drowsiness Monitor - Main Entry Point

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use alerting::AlarmBridge;
use camera_capture::{FrameSource, ImageDirSource};
use dms::{DmsConfig, LandmarkProvider};
use monitor::{
    init_logging, load_trace, FrameDumpOverlay, LogOverlay, MonitorConfig, MonitorSession,
    OverlaySink, QuitSignal,
};

/// Drowsiness monitor - eye-closure detection with a serial alarm
#[derive(Parser)]
#[command(name = "drowsiness-monitor")]
#[command(version)]
#[command(about = "Detect prolonged eye closure and drive an external alarm", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Alarm serial port (e.g. /dev/ttyUSB0, COM13)
    #[arg(long, global = true)]
    port: Option<String>,

    /// Alarm serial baud rate
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Detection preset applied before individual overrides
    #[arg(long, global = true)]
    preset: Option<Preset>,

    /// Eye-closed EAR threshold
    #[arg(long, global = true)]
    threshold: Option<f32>,

    /// Seconds of continuous closure before the alarm
    #[arg(long, global = true)]
    sleep_seconds: Option<f64>,

    /// Do not mirror frames before detection
    #[arg(long, global = true)]
    no_mirror: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Write annotated frames to this directory
    #[arg(long, global = true)]
    dump_frames: Option<PathBuf>,

    /// Dump every Nth frame
    #[arg(long, global = true, default_value = "1")]
    dump_every: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded landmark trace (JSON lines)
    Replay {
        /// Trace file
        #[arg(short, long)]
        trace: PathBuf,
    },

    /// Run face-mesh detection over a directory of images
    Images {
        /// Directory of frames, processed in file name order
        #[arg(short, long)]
        dir: PathBuf,

        /// Frame rate used for timestamps
        #[arg(long)]
        fps: Option<f64>,

        /// Face landmark model (ONNX)
        #[arg(long, default_value = "face_landmark.onnx")]
        model: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Default,
    Strict,
    Lenient,
}

impl Cli {
    fn apply_overrides(&self, config: &mut MonitorConfig) {
        if let Some(preset) = self.preset {
            let base = match preset {
                Preset::Default => DmsConfig::default(),
                Preset::Strict => DmsConfig::strict(),
                Preset::Lenient => DmsConfig::lenient(),
            };
            config.dms.eye_closed_threshold = base.eye_closed_threshold;
            config.dms.sleep_duration_seconds = base.sleep_duration_seconds;
        }
        if let Some(port) = &self.port {
            config.alarm.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.alarm.baud_rate = baud;
        }
        if let Some(threshold) = self.threshold {
            config.dms.eye_closed_threshold = threshold;
        }
        if let Some(seconds) = self.sleep_seconds {
            config.dms.sleep_duration_seconds = seconds;
        }
        if self.no_mirror {
            config.video.mirror = false;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }
        if let Commands::Images { fps: Some(fps), .. } = &self.command {
            config.video.fps = *fps;
        }
    }
}

type Input = (Box<dyn FrameSource>, Box<dyn LandmarkProvider>);

fn open_input(command: &Commands, config: &MonitorConfig) -> anyhow::Result<Input> {
    match command {
        Commands::Replay { trace } => {
            let trace = load_trace(trace)
                .with_context(|| format!("failed to load trace {}", trace.display()))?;
            let (frames, landmarks) = trace.into_parts();
            let source: Box<dyn FrameSource> = Box::new(frames);
            let provider: Box<dyn LandmarkProvider> = Box::new(landmarks);
            Ok((source, provider))
        }
        Commands::Images { dir, model, .. } => {
            let source: Box<dyn FrameSource> =
                Box::new(ImageDirSource::open(dir, &config.video.camera_config())?);
            Ok((source, face_mesh_provider(model)?))
        }
    }
}

#[cfg(feature = "onnx")]
fn face_mesh_provider(model: &std::path::Path) -> anyhow::Result<Box<dyn LandmarkProvider>> {
    let config = dms::FaceMeshConfig {
        model_path: model.display().to_string(),
        ..Default::default()
    };
    Ok(Box::new(dms::FaceMeshDetector::new(&config)?))
}

#[cfg(not(feature = "onnx"))]
fn face_mesh_provider(model: &std::path::Path) -> anyhow::Result<Box<dyn LandmarkProvider>> {
    anyhow::bail!(
        "cannot load {}: built without the `onnx` feature",
        model.display()
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = MonitorConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    init_logging(&config.logging)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let (mut source, mut provider) = open_input(&cli.command, &config)?;

    let mut overlays: Vec<Box<dyn OverlaySink>> = vec![Box::new(LogOverlay::new())];
    if let Some(dir) = &cli.dump_frames {
        let dump = FrameDumpOverlay::new(dir, cli.dump_every)
            .with_context(|| format!("cannot create {}", dir.display()))?;
        overlays.push(Box::new(dump));
    }

    let bridge = AlarmBridge::connect(&config.alarm).await;
    let mut session = MonitorSession::new(config.dms.clone(), bridge, config.video.mirror)?;

    let quit = QuitSignal::new();
    quit.install_ctrl_c();

    let summary = session
        .run(&mut *source, &mut *provider, &mut overlays, &quit)
        .await?;

    info!("Session summary: {}", serde_json::to_string(&summary)?);

    Ok(())
}

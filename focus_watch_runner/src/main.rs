mod capture;
mod detector;
mod launcher;
mod preview;
mod window;

use anyhow::Context;
use clap::Parser;
use focus_watch::config::AppConfig;
use focus_watch::{
    CycleStats, FocusContext, FocusPipeline, StealthFlag, VisibilityController,
    run_detection_cycle,
};
use focus_watch_dashboard::{ServerConfig, StatusBus, start_server};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use capture::OpenCvCapture;
use detector::YoloDetector;
use focus_watch::Detector;
use preview::Preview;
use window::XdotoolBackend;

#[derive(Parser, Debug)]
#[command(name = "focus-watch", about = "Webcam distraction monitor with a live dashboard")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera index (overrides config)
    #[arg(long)]
    camera: Option<i32>,

    /// Replay a video file instead of the camera
    #[arg(long)]
    video: Option<PathBuf>,

    /// ONNX model path (overrides config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Show the annotated debug window
    #[arg(long)]
    preview: bool,

    /// Do not open the companion dashboard window
    #[arg(long)]
    no_launch: bool,

    /// Never hide or show the dashboard window
    #[arg(long)]
    no_stealth: bool,
}

impl Cli {
    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(camera) = self.camera {
            cfg.capture.camera_index = camera;
        }
        if let Some(video) = &self.video {
            cfg.capture.video_path = Some(video.clone());
        }
        if let Some(model) = &self.model {
            cfg.detector.model_path = model.clone();
        }
        if self.preview {
            cfg.capture.preview = true;
        }
        if self.no_launch {
            cfg.window.launch_command = None;
        }
        if self.no_stealth {
            cfg.watch.stealth_enabled = false;
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut cfg = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    cfg.apply_env();
    cli.apply(&mut cfg);
    cfg.watch.validate()?;
    Ok(cfg)
}

/// The blocking detection worker. Owns the capture device, the detector and
/// the pipeline for its whole lifetime.
fn detection_worker(
    cfg: AppConfig,
    context: FocusContext,
    stop: watch::Receiver<bool>,
) -> anyhow::Result<CycleStats> {
    let mut detector = YoloDetector::load(&cfg.detector, cfg.watch.confidence_threshold)?;
    info!("watching for:");
    for class_id in &cfg.watch.watched_ids {
        match detector.class_name(*class_id) {
            Some(name) => info!(" - {name}"),
            None => info!(" - ID {class_id}"),
        }
    }

    let mut source = OpenCvCapture::open(&cfg.capture)?;
    let mut pipeline = FocusPipeline::new(cfg.watch.clone(), context).with_visibility(
        VisibilityController::new(Box::new(XdotoolBackend::new()), cfg.window.title.clone()),
    );

    let mut preview = cfg
        .capture
        .preview
        .then(|| Preview::new(detector.class_names().to_vec()));
    let stats = run_detection_cycle(
        &mut source,
        &mut detector,
        &mut pipeline,
        &stop,
        |frame, detections, _report, pipeline| match preview.as_mut() {
            Some(preview) => preview.show(frame, detections, pipeline),
            None => ControlFlow::Continue(()),
        },
    )?;
    Ok(stats)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "focus_watch=info,focus_watch_dashboard=info,focus_watch_runner=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    info!("focus-watch v{} starting", env!("CARGO_PKG_VERSION"));

    // --- 1. Shared context and dashboard ---
    let bus = StatusBus::new(16);
    let stealth = StealthFlag::new(cfg.watch.stealth_enabled);
    let context = FocusContext::new(stealth.clone(), Arc::new(bus.clone()));
    let server = start_server(bus, stealth, ServerConfig::from(&cfg.dashboard)).await?;

    // --- 2. Startup side effects ---
    tokio::spawn(launcher::launch_companion(
        cfg.window.clone(),
        cfg.dashboard.url(),
    ));

    // --- 3. Detection cycle ---
    let (stop_tx, stop_rx) = watch::channel(false);
    let worker = tokio::task::spawn_blocking(move || detection_worker(cfg, context, stop_rx));
    let stop_on_ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("stop requested");
            let _ = stop_tx.send(true);
        }
    });

    let outcome = worker.await;
    stop_on_ctrl_c.abort();
    server.abort();

    match outcome.context("detection worker panicked")? {
        Ok(stats) => {
            info!(
                frames = stats.frames,
                positives = stats.positive_frames,
                transitions = stats.transitions,
                "monitoring stopped"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "monitoring aborted");
            Err(e)
        }
    }
}

// THEORY:
// The detection cycle is the blocking loop that drives the pipeline:
// read a frame, run inference, feed the detections through the pipeline,
// repeat. It runs on one dedicated worker with no internal parallelism, so
// every frame is fully processed before the next one is read and inference
// latency bounds throughput.
//
// The loop ends cleanly on end-of-stream or when the stop signal is raised.
// A capture or inference error ends it with an error; the core never retries
// and never treats a failed inference as an empty frame.

use crate::core_modules::detection::{DetectionFrame, Detector};
use crate::error::{CaptureError, CycleError};
use crate::pipeline::{FocusPipeline, Report};
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{error, info, trace};

/// A source of frames, typically a webcam.
pub trait FrameSource {
    type Frame;

    /// Returns `Ok(None)` once the stream is exhausted.
    fn read(&mut self) -> Result<Option<Self::Frame>, CaptureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    StopSignal,
    /// A frame hook asked the loop to stop (e.g. the preview window closed).
    Hook,
}

/// Counters gathered while the loop ran.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleStats {
    pub frames: u64,
    pub positive_frames: u64,
    pub transitions: u64,
    pub worst_inference: Duration,
    pub stop_reason: StopReason,
}

/// Runs the blocking capture → detect → decide loop until the stream ends,
/// the stop signal is raised, or a stage fails. `on_frame` runs after the
/// pipeline for every frame, sees the raw frame and its detections, and may
/// break the loop.
pub fn run_detection_cycle<S, D, H>(
    source: &mut S,
    detector: &mut D,
    pipeline: &mut FocusPipeline,
    stop: &watch::Receiver<bool>,
    mut on_frame: H,
) -> Result<CycleStats, CycleError>
where
    S: FrameSource,
    D: Detector<Frame = S::Frame>,
    H: FnMut(&S::Frame, &DetectionFrame, &Report, &FocusPipeline) -> ControlFlow<()>,
{
    let mut worst_inference = Duration::ZERO;
    info!("detection cycle started");

    let stop_reason = loop {
        if *stop.borrow() {
            break StopReason::StopSignal;
        }

        // --- 1. Capture ---
        let frame = match source.read() {
            Ok(Some(frame)) => frame,
            Ok(None) => break StopReason::EndOfStream,
            Err(e) => {
                error!(error = %e, "frame capture failed, stopping detection cycle");
                return Err(e.into());
            }
        };

        // --- 2. Inference ---
        let started = Instant::now();
        let detections = match detector.infer(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                error!(error = %e, "inference failed, stopping detection cycle");
                return Err(e.into());
            }
        };
        worst_inference = worst_inference.max(started.elapsed());

        if !detections.is_empty() {
            trace!(seen = %detections.describe(&*detector), "detections");
        }

        // --- 3. Decision ---
        let report = pipeline.process_frame(&detections);

        if on_frame(&frame, &detections, &report, pipeline).is_break() {
            break StopReason::Hook;
        }
    };

    let stats = CycleStats {
        frames: pipeline.frame_count(),
        positive_frames: pipeline.positive_frames(),
        transitions: pipeline.transitions(),
        worst_inference,
        stop_reason,
    };
    info!(
        frames = stats.frames,
        transitions = stats.transitions,
        worst_inference_ms = stats.worst_inference.as_millis() as u64,
        reason = ?stats.stop_reason,
        "detection cycle finished"
    );
    Ok(stats)
}

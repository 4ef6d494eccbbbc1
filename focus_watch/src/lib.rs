// THEORY:
// This file is the main entry point for the `focus_watch` library crate.
// It exposes the decision core that turns a noisy, per-frame "is a phone in
// view" signal into a stable focused/distracted state, together with the
// collaborator traits (`Detector`, `FrameSource`, `Notifier`, `WindowBackend`)
// that the dashboard and runner crates implement.
//
// The primary entry points are `FocusPipeline` (one frame at a time) and
// `run_detection_cycle` (the blocking capture loop around it).

pub mod config;
pub mod core_modules;
pub mod cycle;
pub mod error;
pub mod pipeline;

pub use config::{AppConfig, WatchConfig};
pub use core_modules::context::{FocusContext, Notifier, NullNotifier, StealthFlag};
pub use core_modules::detection::{Detection, DetectionFrame, Detector};
pub use core_modules::visibility::{VisibilityController, WindowBackend, WindowHandle};
pub use cycle::{CycleStats, FrameSource, StopReason, run_detection_cycle};
pub use error::{CaptureError, ConfigError, CycleError, DetectorError, WindowError};
pub use pipeline::{FocusPipeline, FocusState, Report, StatusEvent};

// THEORY:
// Configuration is read exactly once at startup and is immutable afterwards.
// The `[watch]` section feeds the decision core (classifier + debounce); the
// remaining sections only matter to the I/O plumbing around it. Every section
// has a default, so an empty file (or no file at all) yields a working setup
// that watches for a phone on camera 0.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// COCO class id for "cell phone".
pub const COCO_CELL_PHONE: u32 = 67;

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.35;
const DEFAULT_HISTORY_WINDOW: usize = 5;
const DEFAULT_MAJORITY_THRESHOLD: usize = 3;
const DEFAULT_LEAVE_DELAY: u32 = 20;

/// Tunables for the classifier and the debounce engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Class ids that count as a distraction.
    pub watched_ids: BTreeSet<u32>,
    /// Minimum detector confidence for a watched detection to count.
    pub confidence_threshold: f32,
    /// Number of recent frames kept in the rolling history (`W`).
    pub history_window: usize,
    /// Positive frames within the window required to enter the distracted state (`T`).
    pub majority_threshold: usize,
    /// Consecutive negative frames that must be exceeded before leaving the distracted state.
    pub leave_delay: u32,
    /// Arms stealth mode. The window is only managed once the dashboard also
    /// reports it is ready to hide.
    pub stealth_enabled: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            watched_ids: BTreeSet::from([COCO_CELL_PHONE]),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            history_window: DEFAULT_HISTORY_WINDOW,
            majority_threshold: DEFAULT_MAJORITY_THRESHOLD,
            leave_delay: DEFAULT_LEAVE_DELAY,
            stealth_enabled: true,
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watched_ids.is_empty() {
            return Err(ConfigError::Invalid("watched_ids must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if self.history_window == 0 {
            return Err(ConfigError::Invalid("history_window must be at least 1".into()));
        }
        if self.majority_threshold == 0 || self.majority_threshold > self.history_window {
            return Err(ConfigError::Invalid(format!(
                "majority_threshold {} must be within 1..={}",
                self.majority_threshold, self.history_window
            )));
        }
        Ok(())
    }
}

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Webcam index passed to the capture backend.
    pub camera_index: i32,
    /// Replays a video file instead of the webcam when set.
    pub video_path: Option<PathBuf>,
    /// Shows the annotated debug window.
    pub preview: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            video_path: None,
            preview: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// YOLO model exported to ONNX.
    pub model_path: PathBuf,
    /// Square network input size in pixels.
    pub input_size: i32,
    /// Optional newline separated label file. Falls back to the COCO table.
    pub class_names_path: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("yolov8n.onnx"),
            input_size: 640,
            class_names_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind_addr: String,
    /// Dashboard page served at `/`. The embedded page is used when missing.
    pub index_path: PathBuf,
    /// Directory holding the clip served at `/video`.
    pub video_dir: PathBuf,
    pub video_file: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            index_path: PathBuf::from("index.html"),
            video_dir: PathBuf::from("."),
            video_file: "distraction.mp4".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn url(&self) -> String {
        format!("http://{}", self.bind_addr)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title used to look up the companion window.
    pub title: String,
    /// Program that opens the companion window. `{url}` in any argument is
    /// replaced with the dashboard url.
    pub launch_command: Option<String>,
    pub launch_args: Vec<String>,
    /// Delay before launching, giving the dashboard time to bind.
    pub launch_delay_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Focus Watch".to_string(),
            launch_command: Some("google-chrome".to_string()),
            launch_args: vec!["--app={url}".to_string()],
            launch_delay_ms: 2000,
        }
    }
}

/// The full configuration surface.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watch: WatchConfig,
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    pub dashboard: DashboardConfig,
    pub window: WindowConfig,
}

impl AppConfig {
    /// Loads a TOML file. Relative paths inside it are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut cfg = Self::from_toml(&text)?;
        cfg.rebase_paths(path);
        Ok(cfg)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(text)?;
        cfg.watch.validate()?;
        Ok(cfg)
    }

    /// Applies `FW_BIND`, `FW_MODEL` and `FW_CAMERA` when set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(bind) = lookup("FW_BIND") {
            self.dashboard.bind_addr = bind;
        }
        if let Some(model) = lookup("FW_MODEL") {
            self.detector.model_path = PathBuf::from(model);
        }
        if let Some(camera) = lookup("FW_CAMERA") {
            match camera.parse::<i32>() {
                Ok(index) => self.capture.camera_index = index,
                Err(_) => tracing::warn!(value = %camera, "ignoring non-numeric FW_CAMERA"),
            }
        }
    }

    fn rebase_paths(&mut self, path: &Path) {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        self.detector.model_path = Self::join_base(base, &self.detector.model_path);
        if let Some(names) = &mut self.detector.class_names_path {
            *names = Self::join_base(base, names);
        }
        if let Some(video) = &mut self.capture.video_path {
            *video = Self::join_base(base, video);
        }
        self.dashboard.index_path = Self::join_base(base, &self.dashboard.index_path);
        self.dashboard.video_dir = Self::join_base(base, &self.dashboard.video_dir);
    }

    fn join_base(base: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }
}

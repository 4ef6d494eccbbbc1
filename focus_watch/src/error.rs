// THEORY:
// Errors are split by the collaborator that produces them. Only `CycleError`
// ends the detection loop; window and notifier problems are reported and
// swallowed by the layers that own them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid watch config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device could not be opened: {0}")]
    Open(String),
    #[error("frame read failed: {0}")]
    Read(String),
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("model could not be loaded: {0}")]
    Load(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("malformed detector output: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("no window titled {0:?}")]
    NotFound(String),
    #[error("window backend call failed: {0}")]
    Backend(String),
}

/// A failure that terminates the detection cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Inference(#[from] DetectorError),
}

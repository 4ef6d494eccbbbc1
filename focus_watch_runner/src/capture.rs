use focus_watch::config::CaptureConfig;
use focus_watch::{CaptureError, FrameSource};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use tracing::info;

/// Webcam (or video file) frames read through OpenCV.
pub struct OpenCvCapture {
    cap: VideoCapture,
}

impl OpenCvCapture {
    pub fn open(cfg: &CaptureConfig) -> Result<Self, CaptureError> {
        let cap = match &cfg.video_path {
            Some(path) => {
                info!(path = %path.display(), "reading frames from video file");
                VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)
            }
            None => {
                info!(camera = cfg.camera_index, "reading frames from camera");
                VideoCapture::new(cfg.camera_index, videoio::CAP_ANY)
            }
        }
        .map_err(|e| CaptureError::Open(e.to_string()))?;

        if !cap.is_opened().map_err(|e| CaptureError::Open(e.to_string()))? {
            return Err(CaptureError::Open(match &cfg.video_path {
                Some(path) => format!("cannot open {}", path.display()),
                None => format!("cannot open camera {}", cfg.camera_index),
            }));
        }
        Ok(Self { cap })
    }
}

impl FrameSource for OpenCvCapture {
    type Frame = Mat;

    fn read(&mut self) -> Result<Option<Mat>, CaptureError> {
        let mut frame = Mat::default();
        match self.cap.read(&mut frame) {
            Ok(true) if !frame.empty() => Ok(Some(frame)),
            // The device stopped delivering frames.
            Ok(_) => Ok(None),
            Err(e) => Err(CaptureError::Read(e.to_string())),
        }
    }
}

impl Drop for OpenCvCapture {
    fn drop(&mut self) {
        let _ = self.cap.release();
    }
}

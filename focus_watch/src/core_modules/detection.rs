// THEORY:
// A `DetectionFrame` is the stateless output of one inference call: every
// object the detector saw in a single frame, with its class and confidence.
// It is produced by a `Detector`, consumed once by the classifier, and then
// dropped. No history lives here.

use crate::error::DetectorError;

/// A single object reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Class index in the detector's label table (COCO for YOLO models).
    pub class_id: u32,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Detection {
    pub fn new(class_id: u32, confidence: f32) -> Self {
        Self { class_id, confidence }
    }
}

/// Every detection produced by one inference call, in detector order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionFrame {
    pub detections: Vec<Detection>,
}

impl DetectionFrame {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    /// Renders the frame as `name (0.87), name (0.41)` for the per-frame log.
    pub fn describe<D: Detector + ?Sized>(&self, detector: &D) -> String {
        self.detections
            .iter()
            .map(|d| match detector.class_name(d.class_id) {
                Some(name) => format!("{} ({:.2})", name, d.confidence),
                None => format!("ID {} ({:.2})", d.class_id, d.confidence),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Detection> for DetectionFrame {
    fn from_iter<I: IntoIterator<Item = Detection>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The object detector capability. Must return an empty frame, not an error,
/// when nothing is detected in a well-formed frame.
pub trait Detector {
    type Frame;

    fn infer(&mut self, frame: &Self::Frame) -> Result<DetectionFrame, DetectorError>;

    /// Human readable label for a class id, if the model ships one.
    fn class_name(&self, _class_id: u32) -> Option<&str> {
        None
    }
}

// THEORY:
// `YoloDetector` runs a YOLOv8 model exported to ONNX through OpenCV's DNN
// module. The network emits one column per anchor: four box coordinates
// followed by one score per class. The focus core only needs "which classes
// are present and how confident is the detector", so each anchor is reduced to
// its best class and the frame is collapsed to the strongest detection per
// class. Boxes and NMS are not needed for that question.

use focus_watch::config::DetectorConfig;
use focus_watch::{Detection, DetectionFrame, Detector, DetectorError};
use opencv::core::{CV_32F, Mat, Scalar, Size};
use opencv::dnn::{self, Net};
use opencv::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use tracing::info;

/// Rows before the first class score in a YOLOv8 output column.
const BOX_ROWS: usize = 4;

pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

pub struct YoloDetector {
    net: Net,
    input_size: i32,
    min_confidence: f32,
    class_names: Vec<String>,
}

impl YoloDetector {
    /// Loads the model. Anchors scoring below `min_confidence` are dropped
    /// before they reach the classifier.
    pub fn load(cfg: &DetectorConfig, min_confidence: f32) -> Result<Self, DetectorError> {
        let model_path = cfg.model_path.to_string_lossy();
        let net = dnn::read_net_from_onnx(&model_path)
            .map_err(|e| DetectorError::Load(format!("{model_path}: {e}")))?;

        let class_names = match &cfg.class_names_path {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| DetectorError::Load(format!("{}: {e}", path.display())))?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            None => COCO_CLASSES.iter().map(|s| s.to_string()).collect(),
        };

        info!(model = %model_path, classes = class_names.len(), "detector loaded");
        Ok(Self {
            net,
            input_size: cfg.input_size,
            min_confidence,
            class_names,
        })
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn forward(&mut self, frame: &Mat) -> opencv::Result<Mat> {
        let blob = dnn::blob_from_image(
            frame,
            1.0 / 255.0,
            Size::new(self.input_size, self.input_size),
            Scalar::default(),
            true,
            false,
            CV_32F,
        )?;
        self.net.set_input(&blob, "", 1.0, Scalar::default())?;
        self.net.forward_single("")
    }
}

impl Detector for YoloDetector {
    type Frame = Mat;

    fn infer(&mut self, frame: &Mat) -> Result<DetectionFrame, DetectorError> {
        let output = self
            .forward(frame)
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        // Expected shape: [1, 4 + classes, anchors].
        let dims = output.mat_size();
        if dims.len() != 3 || dims[1] as usize <= BOX_ROWS {
            return Err(DetectorError::Malformed(format!(
                "unexpected output shape {:?}",
                &*dims
            )));
        }
        let rows = dims[1] as usize;
        let anchors = dims[2] as usize;
        let data = output
            .data_typed::<f32>()
            .map_err(|e| DetectorError::Malformed(e.to_string()))?;

        decode_yolov8(data, rows, anchors, self.min_confidence)
    }

    fn class_name(&self, class_id: u32) -> Option<&str> {
        self.class_names.get(class_id as usize).map(String::as_str)
    }
}

/// Reduces a row-major `[rows, anchors]` YOLOv8 output to the strongest
/// detection per class, ordered by confidence.
pub fn decode_yolov8(
    data: &[f32],
    rows: usize,
    anchors: usize,
    min_confidence: f32,
) -> Result<DetectionFrame, DetectorError> {
    if data.len() < rows * anchors {
        return Err(DetectorError::Malformed(format!(
            "expected {} values, got {}",
            rows * anchors,
            data.len()
        )));
    }

    let mut best: BTreeMap<u32, f32> = BTreeMap::new();
    for anchor in 0..anchors {
        let scores = (BOX_ROWS..rows).map(|row| data[row * anchors + anchor]);
        let Some((class, score)) = scores
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            continue;
        };
        if score < min_confidence {
            continue;
        }
        let entry = best.entry(class as u32).or_insert(score);
        *entry = (*entry).max(score);
    }

    let mut detections: Vec<Detection> = best
        .into_iter()
        .map(|(class_id, confidence)| Detection::new(class_id, confidence))
        .collect();
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(DetectionFrame::new(detections))
}

use focus_watch::{DetectionFrame, FocusPipeline, FocusState, WatchConfig};
use opencv::core::{Mat, Point, Scalar};
use opencv::prelude::*;
use opencv::{highgui, imgproc};
use std::ops::ControlFlow;
use tracing::warn;

const WINDOW: &str = "focus-watch preview (q quits)";

/// One detection line drawn under the state label.
#[derive(Debug, Clone, PartialEq)]
struct DetectionLabel {
    text: String,
    watched: bool,
}

fn detection_labels(
    detections: &DetectionFrame,
    labels: &[String],
    watch: &WatchConfig,
) -> Vec<DetectionLabel> {
    detections
        .iter()
        .map(|d| {
            let name = labels
                .get(d.class_id as usize)
                .map(String::as_str)
                .map_or_else(|| format!("ID {}", d.class_id), str::to_string);
            DetectionLabel {
                text: format!("{name} {:.2}", d.confidence),
                watched: watch.watched_ids.contains(&d.class_id)
                    && d.confidence >= watch.confidence_threshold,
            }
        })
        .collect()
}

/// Debug window showing each frame with the focus state and the detections
/// burned in.
pub struct Preview {
    labels: Vec<String>,
    failed: bool,
}

impl Preview {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            failed: false,
        }
    }

    /// Draws the frame. Returns `Break` when the user presses `q`.
    pub fn show(
        &mut self,
        frame: &Mat,
        detections: &DetectionFrame,
        pipeline: &FocusPipeline,
    ) -> ControlFlow<()> {
        if self.failed {
            return ControlFlow::Continue(());
        }
        let lines = detection_labels(detections, &self.labels, pipeline.config());
        match Self::draw(frame, &lines, pipeline) {
            Ok(true) => ControlFlow::Break(()),
            Ok(false) => ControlFlow::Continue(()),
            Err(e) => {
                // Keep tracking focus even if the display is unavailable.
                warn!(error = %e, "preview disabled");
                self.failed = true;
                ControlFlow::Continue(())
            }
        }
    }

    fn draw(frame: &Mat, lines: &[DetectionLabel], pipeline: &FocusPipeline) -> opencv::Result<bool> {
        let mut annotated = frame.try_clone()?;
        let alert = Scalar::new(60.0, 60.0, 255.0, 0.0);
        let (label, color) = match pipeline.state() {
            FocusState::Focused => ("FOCUSED", Scalar::new(80.0, 200.0, 80.0, 0.0)),
            FocusState::Distracted => ("DISTRACTED", alert),
        };
        let debounce = pipeline.debounce();
        let detail = format!(
            "window {}/{}  misses {}",
            debounce.positive_count(),
            debounce.window(),
            debounce.off_counter()
        );

        imgproc::put_text(
            &mut annotated,
            label,
            Point::new(16, 40),
            imgproc::FONT_HERSHEY_SIMPLEX,
            1.2,
            color,
            2,
            imgproc::LINE_8,
            false,
        )?;
        imgproc::put_text(
            &mut annotated,
            &detail,
            Point::new(16, 72),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.6,
            Scalar::all(230.0),
            1,
            imgproc::LINE_8,
            false,
        )?;

        for (row, line) in lines.iter().enumerate() {
            imgproc::put_text(
                &mut annotated,
                &line.text,
                Point::new(16, 100 + 22 * row as i32),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.55,
                if line.watched { alert } else { Scalar::all(200.0) },
                1,
                imgproc::LINE_8,
                false,
            )?;
        }

        highgui::imshow(WINDOW, &annotated)?;
        let key = highgui::wait_key(1)?;
        Ok(key & 0xFF == 'q' as i32)
    }
}

impl Drop for Preview {
    fn drop(&mut self) {
        if !self.failed {
            let _ = highgui::destroy_all_windows();
        }
    }
}

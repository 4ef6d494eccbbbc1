use crate::config::WatchConfig;
use crate::core_modules::detection::DetectionFrame;

/// Decides whether a single frame contains a distraction: at least one
/// detection of a watched class at or above the confidence threshold.
pub fn classify(frame: &DetectionFrame, config: &WatchConfig) -> bool {
    frame.iter().any(|d| {
        config.watched_ids.contains(&d.class_id) && d.confidence >= config.confidence_threshold
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::detection::Detection;

    fn frame(detections: &[(u32, f32)]) -> DetectionFrame {
        detections
            .iter()
            .map(|&(class_id, confidence)| Detection::new(class_id, confidence))
            .collect()
    }

    #[test]
    fn empty_frame_is_negative() {
        assert!(!classify(&DetectionFrame::empty(), &WatchConfig::default()));
    }

    #[test]
    fn watched_class_at_threshold_is_positive() {
        let config = WatchConfig::default();
        assert!(classify(&frame(&[(0, 0.9), (67, 0.35)]), &config));
    }

    #[test]
    fn watched_class_below_threshold_is_negative() {
        let config = WatchConfig::default();
        assert!(!classify(&frame(&[(67, 0.34)]), &config));
    }

    #[test]
    fn unwatched_class_never_counts() {
        let config = WatchConfig::default();
        assert!(!classify(&frame(&[(0, 0.99), (73, 0.99)]), &config));
    }
}

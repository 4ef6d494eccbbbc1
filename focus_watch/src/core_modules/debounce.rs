// THEORY:
// The `DebounceEngine` turns the raw, flickering per-frame classification into
// a stable signal. It holds two independent pieces of memory:
//
// 1.  **Rolling History**: the last `W` classifications. Entry into the
//     distracted state only needs a simple majority (`T` positives) anywhere in
//     that window, so a phone that is seen in most frames registers quickly
//     even if the detector misses it now and then.
// 2.  **Absence Counter**: the number of consecutive negative frames since the
//     last positive one. Leaving the distracted state requires this counter to
//     exceed `leave_delay`, which is usually much longer than the window. A
//     momentary occlusion therefore never ends a distraction.
//
// The engine only ever reports *changes* of its smoothed output. The caller
// never sees the per-frame signal.

use crate::config::WatchConfig;
use std::collections::VecDeque;

/// Stateful hysteresis filter over per-frame classifications.
#[derive(Debug, Clone)]
pub struct DebounceEngine {
    /// The most recent classifications, oldest first. Never longer than `window`.
    history: VecDeque<bool>,
    window: usize,
    majority_threshold: usize,
    leave_delay: u32,
    /// Consecutive negative frames since the last positive one.
    off_counter: u32,
    /// The smoothed output last reported to the caller.
    distracted: bool,
}

impl DebounceEngine {
    pub fn new(config: &WatchConfig) -> Self {
        Self::with_params(
            config.history_window,
            config.majority_threshold,
            config.leave_delay,
        )
    }

    pub fn with_params(window: usize, majority_threshold: usize, leave_delay: u32) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
            majority_threshold,
            leave_delay,
            off_counter: 0,
            distracted: false,
        }
    }

    /// Consumes one frame's classification. Returns `Some(is_distracted)` only
    /// when the smoothed state flips.
    pub fn observe(&mut self, positive: bool) -> Option<bool> {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(positive);

        if positive {
            self.off_counter = 0;
        } else {
            self.off_counter = self.off_counter.saturating_add(1);
        }

        let majority = self.majority();
        let next = if self.distracted {
            majority || self.off_counter <= self.leave_delay
        } else {
            majority
        };

        if next == self.distracted {
            return None;
        }
        self.distracted = next;
        Some(next)
    }

    /// Whether the window currently holds at least `T` positive frames.
    pub fn majority(&self) -> bool {
        self.positive_count() >= self.majority_threshold
    }

    pub fn positive_count(&self) -> usize {
        self.history.iter().filter(|&&p| p).count()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn off_counter(&self) -> u32 {
        self.off_counter
    }

    pub fn is_distracted(&self) -> bool {
        self.distracted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(engine: &mut DebounceEngine, input: &[bool]) -> Vec<(usize, bool)> {
        input
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| engine.observe(p).map(|change| (i, change)))
            .collect()
    }

    #[test]
    fn majority_enters_on_the_third_positive() {
        let mut engine = DebounceEngine::with_params(5, 3, 15);
        let changes = feed(&mut engine, &[true, true, true, false, false]);

        assert_eq!(changes, vec![(2, true)]);
        assert!(engine.is_distracted());
        assert_eq!(engine.off_counter(), 2);
    }

    #[test]
    fn non_consecutive_positives_still_form_a_majority() {
        let mut engine = DebounceEngine::with_params(5, 3, 15);
        let changes = feed(&mut engine, &[true, false, true, false, true]);

        assert_eq!(changes, vec![(4, true)]);
    }

    #[test]
    fn startup_history_is_not_padded() {
        let mut engine = DebounceEngine::with_params(5, 1, 3);
        assert_eq!(engine.observe(true), Some(true));
        assert_eq!(engine.history_len(), 1);
    }

    #[test]
    fn leaving_needs_more_than_leave_delay_misses() {
        let mut engine = DebounceEngine::with_params(5, 3, 15);
        feed(&mut engine, &[true, true, true]);

        for _ in 0..15 {
            assert_eq!(engine.observe(false), None);
        }
        assert_eq!(engine.off_counter(), 15);
        assert_eq!(engine.observe(false), Some(false));
        assert_eq!(engine.off_counter(), 16);
        assert_eq!(engine.observe(false), None);
    }

    #[test]
    fn a_single_positive_resets_the_absence_counter() {
        let mut engine = DebounceEngine::with_params(5, 3, 4);
        feed(&mut engine, &[true, true, true, false, false, false, false]);
        assert_eq!(engine.observe(true), None);
        assert_eq!(engine.off_counter(), 0);

        let changes = feed(&mut engine, &[false; 5]);
        assert_eq!(changes, vec![(4, false)]);
    }

    #[test]
    fn zero_leave_delay_exits_once_the_majority_clears() {
        let mut engine = DebounceEngine::with_params(3, 2, 0);
        feed(&mut engine, &[true, true]);
        assert!(engine.is_distracted());

        // [T, T, F]: the majority still holds.
        assert_eq!(engine.observe(false), None);
        // [T, F, F]
        assert_eq!(engine.observe(false), Some(false));
    }

    #[test]
    fn history_is_bounded_by_the_window() {
        let mut engine = DebounceEngine::with_params(4, 2, 1);
        for i in 0..50 {
            engine.observe(i % 3 == 0);
            assert!(engine.history_len() <= 4);
        }
        assert_eq!(engine.history_len(), 4);
    }
}

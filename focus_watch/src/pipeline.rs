// THEORY:
// The `pipeline` module is the top-level API of the decision core. It wires the
// stages together for a single frame's detections:
//
//   classify -> debounce -> focus state machine -> {notifier, visibility}
//
// The pipeline is owned by exactly one worker, which makes it the single
// writer of the debounce and focus state. Observers only ever see the
// `StatusEvent`s it emits through the shared `FocusContext`.

use crate::config::WatchConfig;
use crate::core_modules::classifier::classify;
use crate::core_modules::context::FocusContext;
use crate::core_modules::debounce::DebounceEngine;
use crate::core_modules::detection::DetectionFrame;
use crate::core_modules::focus_state::FocusStateMachine;
use crate::core_modules::visibility::VisibilityController;
use tracing::{debug, info};

// Re-export key data structures for the public API.
pub use crate::core_modules::focus_state::{FocusState, StatusEvent, Transition};
pub use crate::core_modules::visibility::{Visibility, VisibilityOutcome};

/// Detail of a frame that flipped the focus state.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionData {
    pub transition: Transition,
    /// Result of the window request, when stealth mode is engaged.
    pub visibility: Option<VisibilityOutcome>,
}

/// The output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    NoChange,
    Transition(TransitionData),
}

impl Report {
    pub fn transition(&self) -> Option<&Transition> {
        match self {
            Report::NoChange => None,
            Report::Transition(data) => Some(&data.transition),
        }
    }
}

pub struct FocusPipeline {
    config: WatchConfig,
    debounce: DebounceEngine,
    focus: FocusStateMachine,
    context: FocusContext,
    visibility: Option<VisibilityController>,
    /// Whether the window has been aligned with the focus state since stealth
    /// was engaged. Stays false until a request actually lands.
    stealth_synced: bool,
    frame_count: u64,
    positive_frames: u64,
}

impl FocusPipeline {
    pub fn new(config: WatchConfig, context: FocusContext) -> Self {
        Self {
            debounce: DebounceEngine::new(&config),
            config,
            focus: FocusStateMachine::new(),
            context,
            visibility: None,
            stealth_synced: false,
            frame_count: 0,
            positive_frames: 0,
        }
    }

    /// Attaches the window controller used once stealth mode is engaged.
    pub fn with_visibility(mut self, controller: VisibilityController) -> Self {
        self.visibility = Some(controller);
        self
    }

    pub fn process_frame(&mut self, detections: &DetectionFrame) -> Report {
        let frame = self.frame_count;
        self.frame_count += 1;

        // Stage 1: Per-frame classification
        let positive = classify(detections, &self.config);
        if positive {
            self.positive_frames += 1;
        }

        // Stage 2: Temporal smoothing
        let change = self.debounce.observe(positive);
        debug!(
            frame,
            positive,
            window_positives = self.debounce.positive_count(),
            off_counter = self.debounce.off_counter(),
            "frame classified"
        );

        // Stage 3: State transition, emitted only on a genuine flip
        let transition = self.focus.apply(change, frame);
        if let Some(t) = &transition {
            match t.to {
                FocusState::Distracted => info!(frame, "distraction detected"),
                FocusState::Focused => info!(frame, "focus restored"),
            }
            self.context.notifier.emit(t.event());
        }

        // Stage 4: Window side channel
        let visibility = self.update_visibility(transition.is_some());

        match transition {
            Some(transition) => Report::Transition(TransitionData {
                transition,
                visibility,
            }),
            None => Report::NoChange,
        }
    }

    fn update_visibility(&mut self, flipped: bool) -> Option<VisibilityOutcome> {
        if !self.context.stealth.is_engaged() {
            return None;
        }
        let controller = self.visibility.as_mut()?;
        if !flipped && self.stealth_synced {
            return None;
        }
        let outcome = controller.on_state_change(self.focus.state().is_active());
        self.stealth_synced = matches!(
            outcome,
            VisibilityOutcome::Applied(_) | VisibilityOutcome::Unchanged
        );
        Some(outcome)
    }

    pub fn state(&self) -> FocusState {
        self.focus.state()
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn debounce(&self) -> &DebounceEngine {
        &self.debounce
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn positive_frames(&self) -> u64 {
        self.positive_frames
    }

    pub fn transitions(&self) -> u64 {
        self.focus.transitions()
    }
}

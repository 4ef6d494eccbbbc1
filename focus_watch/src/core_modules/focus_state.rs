// THEORY:
// The `FocusStateMachine` owns the single authoritative answer to "is the user
// distracted right now". It is fed the debounce engine's change reports and
// diffs them against its own state, so a transition is produced only for a
// genuine flip. Everything downstream (dashboard, window control) reacts to
// `Transition`s and never to raw frames.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusState {
    #[default]
    Focused,
    Distracted,
}

impl FocusState {
    pub fn from_active(active: bool) -> Self {
        if active {
            FocusState::Distracted
        } else {
            FocusState::Focused
        }
    }

    /// `true` while a distraction is in view.
    pub fn is_active(self) -> bool {
        matches!(self, FocusState::Distracted)
    }
}

impl fmt::Display for FocusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusState::Focused => f.write_str("focused"),
            FocusState::Distracted => f.write_str("distracted"),
        }
    }
}

/// The payload broadcast to dashboard clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub active: bool,
}

impl From<FocusState> for StatusEvent {
    fn from(state: FocusState) -> Self {
        Self {
            active: state.is_active(),
        }
    }
}

/// A single observed flip of the focus state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: FocusState,
    pub to: FocusState,
    /// Index of the frame that caused the flip.
    pub frame: u64,
}

impl Transition {
    pub fn event(&self) -> StatusEvent {
        self.to.into()
    }
}

#[derive(Debug, Default)]
pub struct FocusStateMachine {
    state: FocusState,
    transitions: u64,
}

impl FocusStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Number of flips since start.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Applies a smoothed change report. Reports that agree with the current
    /// state are absorbed without producing a transition.
    pub fn apply(&mut self, change: Option<bool>, frame: u64) -> Option<Transition> {
        let target = FocusState::from_active(change?);
        if target == self.state {
            return None;
        }

        let transition = Transition {
            from: self.state,
            to: target,
            frame,
        };
        self.state = target;
        self.transitions += 1;
        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_focused() {
        let machine = FocusStateMachine::new();
        assert_eq!(machine.state(), FocusState::Focused);
        assert_eq!(machine.transitions(), 0);
    }

    #[test]
    fn flips_produce_one_transition_each() {
        let mut machine = FocusStateMachine::new();

        let enter = machine.apply(Some(true), 3).unwrap();
        assert_eq!(enter.from, FocusState::Focused);
        assert_eq!(enter.to, FocusState::Distracted);
        assert_eq!(enter.event(), StatusEvent { active: true });

        let leave = machine.apply(Some(false), 20).unwrap();
        assert_eq!(leave.to, FocusState::Focused);
        assert_eq!(leave.frame, 20);
        assert_eq!(machine.transitions(), 2);
    }

    #[test]
    fn repeated_reports_are_absorbed() {
        let mut machine = FocusStateMachine::new();
        assert!(machine.apply(None, 0).is_none());
        assert!(machine.apply(Some(false), 1).is_none());
        assert!(machine.apply(Some(true), 2).is_some());
        assert!(machine.apply(Some(true), 3).is_none());
        assert_eq!(machine.transitions(), 1);
    }

    #[test]
    fn status_event_serializes_as_active_flag() {
        let json = serde_json::to_string(&StatusEvent { active: true }).unwrap();
        assert_eq!(json, r#"{"active":true}"#);
        assert_eq!(FocusState::Distracted.to_string(), "distracted");
    }
}

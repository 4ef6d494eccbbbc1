use focus_watch::core_modules::visibility::{Visibility, VisibilityOutcome};
use focus_watch::pipeline::TransitionData;
use focus_watch::{
    Detection, DetectionFrame, FocusContext, FocusPipeline, FocusState, Notifier, Report,
    StatusEvent, StealthFlag, VisibilityController, WatchConfig, WindowBackend, WindowError,
    WindowHandle,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<StatusEvent>>);

impl RecordingNotifier {
    fn events(&self) -> Vec<StatusEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn emit(&self, event: StatusEvent) {
        self.0.lock().unwrap().push(event);
    }
}

#[derive(Clone, Default)]
struct CountingBackend {
    calls: Arc<Mutex<Vec<&'static str>>>,
    window_exists: bool,
}

impl CountingBackend {
    fn with_window() -> Self {
        Self {
            window_exists: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl WindowBackend for CountingBackend {
    fn find(&self, title: &str) -> Result<WindowHandle, WindowError> {
        self.calls.lock().unwrap().push("find");
        if !self.window_exists {
            return Err(WindowError::NotFound(title.to_string()));
        }
        Ok(WindowHandle(7))
    }

    fn show(&self, _handle: WindowHandle) -> Result<(), WindowError> {
        self.calls.lock().unwrap().push("show");
        Ok(())
    }

    fn hide(&self, _handle: WindowHandle) -> Result<(), WindowError> {
        self.calls.lock().unwrap().push("hide");
        Ok(())
    }

    fn raise_and_focus(&self, _handle: WindowHandle) -> Result<(), WindowError> {
        self.calls.lock().unwrap().push("raise");
        Ok(())
    }
}

fn config() -> WatchConfig {
    WatchConfig {
        history_window: 5,
        majority_threshold: 3,
        leave_delay: 15,
        ..WatchConfig::default()
    }
}

fn frame(positive: bool) -> DetectionFrame {
    if positive {
        DetectionFrame::new(vec![Detection::new(0, 0.95), Detection::new(67, 0.71)])
    } else {
        DetectionFrame::new(vec![Detection::new(0, 0.95)])
    }
}

struct Harness {
    pipeline: FocusPipeline,
    notifier: Arc<RecordingNotifier>,
    stealth: StealthFlag,
}

impl Harness {
    fn new(backend: Option<CountingBackend>) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let stealth = StealthFlag::new(true);
        let context = FocusContext::new(stealth.clone(), notifier.clone());
        let mut pipeline = FocusPipeline::new(config(), context);
        if let Some(backend) = backend {
            pipeline = pipeline.with_visibility(VisibilityController::new(Box::new(backend), "Focus Watch"));
        }
        Self {
            pipeline,
            notifier,
            stealth,
        }
    }

    fn run(&mut self, input: &[bool]) -> Vec<Report> {
        input
            .iter()
            .map(|&p| self.pipeline.process_frame(&frame(p)))
            .collect()
    }
}

fn transitions(reports: &[Report]) -> Vec<(usize, FocusState)> {
    reports
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.transition().map(|t| (i, t.to)))
        .collect()
}

#[test]
fn three_of_five_enters_distracted_once() {
    let mut harness = Harness::new(None);
    let reports = harness.run(&[true, true, true, false, false]);

    assert_eq!(transitions(&reports), vec![(2, FocusState::Distracted)]);
    assert_eq!(harness.notifier.events(), vec![StatusEvent { active: true }]);
}

#[test]
fn sixteenth_consecutive_miss_restores_focus() {
    let mut harness = Harness::new(None);
    harness.run(&[true, true, true]);

    let reports = harness.run(&[false; 15]);
    assert!(transitions(&reports).is_empty());
    assert_eq!(harness.pipeline.state(), FocusState::Distracted);

    let reports = harness.run(&[false]);
    assert_eq!(transitions(&reports), vec![(0, FocusState::Focused)]);
    assert_eq!(harness.pipeline.debounce().off_counter(), 16);

    harness.run(&[false; 30]);
    assert_eq!(
        harness.notifier.events(),
        vec![StatusEvent { active: true }, StatusEvent { active: false }]
    );
}

#[test]
fn interleaved_positives_form_a_majority() {
    let mut harness = Harness::new(None);
    let reports = harness.run(&[true, false, true, false, true]);

    assert_eq!(transitions(&reports), vec![(4, FocusState::Distracted)]);
}

#[test]
fn without_stealth_the_window_is_never_touched() {
    let backend = CountingBackend::with_window();
    let mut harness = Harness::new(Some(backend.clone()));

    harness.run(&[true, true, true]);
    harness.run(&[false; 20]);
    harness.run(&[true, true, true]);

    assert_eq!(harness.pipeline.transitions(), 3);
    assert!(backend.calls().is_empty());
}

#[test]
fn missing_window_does_not_block_the_transition() {
    let backend = CountingBackend::default();
    let mut harness = Harness::new(Some(backend.clone()));
    harness.stealth.engage();

    let reports = harness.run(&[true, true, true]);

    let Report::Transition(TransitionData { transition, visibility }) = &reports[2] else {
        panic!("expected a transition on the third frame, got {:?}", reports[2]);
    };
    assert_eq!(transition.to, FocusState::Distracted);
    assert_eq!(visibility, &Some(VisibilityOutcome::WindowMissing));
    assert_eq!(harness.pipeline.state(), FocusState::Distracted);
    assert_eq!(harness.notifier.events(), vec![StatusEvent { active: true }]);
}

#[test]
fn stealth_shows_on_distraction_and_hides_on_recovery() {
    let backend = CountingBackend::with_window();
    let mut harness = Harness::new(Some(backend.clone()));
    harness.stealth.engage();

    let reports = harness.run(&[false]);
    assert_eq!(reports, vec![Report::NoChange]);
    assert_eq!(backend.calls(), vec!["find", "hide"]);

    let reports = harness.run(&[true, true, true]);
    let Report::Transition(data) = &reports[2] else {
        panic!("expected a transition");
    };
    assert_eq!(data.visibility, Some(VisibilityOutcome::Applied(Visibility::Shown)));

    harness.run(&[false; 16]);
    assert_eq!(
        backend.calls(),
        vec!["find", "hide", "find", "show", "raise", "find", "hide"]
    );
}

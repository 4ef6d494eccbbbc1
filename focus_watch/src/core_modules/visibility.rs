// THEORY:
// Stealth mode keeps the dashboard window out of sight while the user is
// focused and throws it in front of them the moment a distraction is
// confirmed. The `VisibilityController` is a small state machine of its own:
// it remembers the visibility it last applied and skips any request that
// would not change it, so the native backend is never asked to flap.
//
// Window control is a side channel. A missing window or a failed native call
// is logged and reported, but never feeds back into focus tracking.

use crate::error::WindowError;
use tracing::{debug, info, warn};

/// Opaque native window id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

/// Native show/hide primitives, keyed by window title. Every call is best
/// effort and must tolerate redundant requests.
pub trait WindowBackend {
    /// Fails with `WindowError::NotFound` when no window carries `title`.
    fn find(&self, title: &str) -> Result<WindowHandle, WindowError>;
    fn show(&self, handle: WindowHandle) -> Result<(), WindowError>;
    fn hide(&self, handle: WindowHandle) -> Result<(), WindowError>;
    /// Brings the window to the front, focuses it and keeps it above others.
    fn raise_and_focus(&self, handle: WindowHandle) -> Result<(), WindowError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Shown,
    Hidden,
}

impl Visibility {
    pub fn for_active(active: bool) -> Self {
        if active { Visibility::Shown } else { Visibility::Hidden }
    }
}

/// What happened to a visibility request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityOutcome {
    Applied(Visibility),
    /// The window is already in the requested state; no backend call was made.
    Unchanged,
    WindowMissing,
    Failed(String),
}

pub struct VisibilityController {
    backend: Box<dyn WindowBackend + Send>,
    title: String,
    /// Visibility last applied successfully. `None` until the first request.
    applied: Option<Visibility>,
    /// Set after a failed request until the next success, so retries stay
    /// quiet.
    degraded: bool,
}

impl VisibilityController {
    pub fn new(backend: Box<dyn WindowBackend + Send>, title: impl Into<String>) -> Self {
        Self {
            backend,
            title: title.into(),
            applied: None,
            degraded: false,
        }
    }

    pub fn applied(&self) -> Option<Visibility> {
        self.applied
    }

    /// Reacts to a focus flip. `active == true` shows and raises the window,
    /// `false` hides it.
    pub fn on_state_change(&mut self, active: bool) -> VisibilityOutcome {
        let target = Visibility::for_active(active);
        if self.applied == Some(target) {
            debug!(?target, "window already in requested state");
            return VisibilityOutcome::Unchanged;
        }

        match self.apply(target) {
            Ok(()) => {
                info!(title = %self.title, ?target, "window visibility changed");
                self.applied = Some(target);
                self.degraded = false;
                VisibilityOutcome::Applied(target)
            }
            Err(e) => {
                if std::mem::replace(&mut self.degraded, true) {
                    debug!(title = %self.title, error = %e, "window request failed again");
                } else {
                    warn!(title = %self.title, error = %e, "window request failed");
                }
                match e {
                    WindowError::NotFound(_) => VisibilityOutcome::WindowMissing,
                    WindowError::Backend(msg) => VisibilityOutcome::Failed(msg),
                }
            }
        }
    }

    fn apply(&self, target: Visibility) -> Result<(), WindowError> {
        let handle = self.backend.find(&self.title)?;
        match target {
            Visibility::Shown => {
                self.backend.show(handle)?;
                self.backend.raise_and_focus(handle)?;
            }
            Visibility::Hidden => self.backend.hide(handle)?,
        }
        Ok(())
    }
}

/// Test double that records every backend call.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Find,
        Show,
        Hide,
        Raise,
    }

    #[derive(Clone, Default)]
    pub struct RecordingBackend {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub missing: Arc<AtomicBool>,
        pub failing: bool,
    }

    impl RecordingBackend {
        /// A backend whose window does not exist yet.
        pub fn without_window() -> Self {
            let backend = Self::default();
            backend.set_missing(true);
            backend
        }

        pub fn set_missing(&self, missing: bool) {
            self.missing.store(missing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<(), WindowError> {
            self.calls.lock().unwrap().push(call);
            if self.failing {
                return Err(WindowError::Backend("xdotool exited with 1".into()));
            }
            Ok(())
        }
    }

    impl WindowBackend for RecordingBackend {
        fn find(&self, title: &str) -> Result<WindowHandle, WindowError> {
            self.calls.lock().unwrap().push(Call::Find);
            if self.missing.load(Ordering::SeqCst) {
                return Err(WindowError::NotFound(title.to_string()));
            }
            Ok(WindowHandle(0x2a))
        }

        fn show(&self, _handle: WindowHandle) -> Result<(), WindowError> {
            self.record(Call::Show)
        }

        fn hide(&self, _handle: WindowHandle) -> Result<(), WindowError> {
            self.record(Call::Hide)
        }

        fn raise_and_focus(&self, _handle: WindowHandle) -> Result<(), WindowError> {
            self.record(Call::Raise)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingBackend};
    use super::*;

    #[test]
    fn show_raises_and_hide_hides() {
        let backend = RecordingBackend::default();
        let mut controller = VisibilityController::new(Box::new(backend.clone()), "Focus Watch");

        assert_eq!(
            controller.on_state_change(true),
            VisibilityOutcome::Applied(Visibility::Shown)
        );
        assert_eq!(
            controller.on_state_change(false),
            VisibilityOutcome::Applied(Visibility::Hidden)
        );
        assert_eq!(
            backend.calls(),
            vec![Call::Find, Call::Show, Call::Raise, Call::Find, Call::Hide]
        );
    }

    #[test]
    fn repeated_requests_do_not_reach_the_backend() {
        let backend = RecordingBackend::default();
        let mut controller = VisibilityController::new(Box::new(backend.clone()), "Focus Watch");

        controller.on_state_change(false);
        assert_eq!(controller.on_state_change(false), VisibilityOutcome::Unchanged);
        assert_eq!(controller.on_state_change(false), VisibilityOutcome::Unchanged);
        assert_eq!(backend.calls(), vec![Call::Find, Call::Hide]);
    }

    #[test]
    fn missing_window_is_reported_and_retried_later() {
        let backend = RecordingBackend::without_window();
        let mut controller = VisibilityController::new(Box::new(backend.clone()), "Focus Watch");

        assert_eq!(controller.on_state_change(true), VisibilityOutcome::WindowMissing);
        assert_eq!(controller.applied(), None);
        assert_eq!(controller.on_state_change(true), VisibilityOutcome::WindowMissing);
        assert_eq!(backend.calls(), vec![Call::Find, Call::Find]);

        backend.set_missing(false);
        assert_eq!(
            controller.on_state_change(true),
            VisibilityOutcome::Applied(Visibility::Shown)
        );
        assert_eq!(controller.applied(), Some(Visibility::Shown));
    }

    #[test]
    fn backend_failure_is_reported() {
        let backend = RecordingBackend {
            failing: true,
            ..Default::default()
        };
        let mut controller = VisibilityController::new(Box::new(backend), "Focus Watch");

        assert!(matches!(
            controller.on_state_change(false),
            VisibilityOutcome::Failed(_)
        ));
        assert_eq!(controller.applied(), None);
    }
}

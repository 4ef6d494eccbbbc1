// THEORY:
// `FocusContext` is the only state shared across workers. It bundles the
// stealth flag (written once by the dashboard, read by the detection cycle)
// with the notifier that carries status events out of the cycle. Focus and
// debounce state are deliberately absent: they live inside the pipeline and
// are owned by the detection worker alone.

use crate::core_modules::focus_state::StatusEvent;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Broadcasts status events to whoever is listening. Delivery is best effort
/// and never acknowledged.
pub trait Notifier: Send + Sync {
    fn emit(&self, event: StatusEvent);
}

/// Drops every event. Used when nothing is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn emit(&self, _event: StatusEvent) {}
}

/// Process-lifetime stealth switch. Once engaged it stays engaged.
#[derive(Debug, Clone)]
pub struct StealthFlag {
    armed: bool,
    engaged_tx: Arc<watch::Sender<bool>>,
}

impl StealthFlag {
    /// `armed == false` makes every engage request a no-op.
    pub fn new(armed: bool) -> Self {
        let (engaged_tx, _) = watch::channel(false);
        Self {
            armed,
            engaged_tx: Arc::new(engaged_tx),
        }
    }

    pub fn is_engaged(&self) -> bool {
        *self.engaged_tx.borrow()
    }

    /// Handles the inbound "ready to hide" signal. Returns `true` only for the
    /// call that actually engaged stealth mode.
    pub fn engage(&self) -> bool {
        if !self.armed {
            debug!("stealth requested but disabled in config");
            return false;
        }
        let changed = self.engaged_tx.send_if_modified(|engaged| {
            if *engaged {
                false
            } else {
                *engaged = true;
                true
            }
        });
        if changed {
            info!("stealth mode engaged");
        }
        changed
    }
}

/// Shared handles passed to the detection cycle and to the dashboard.
#[derive(Clone)]
pub struct FocusContext {
    pub stealth: StealthFlag,
    pub notifier: Arc<dyn Notifier>,
}

impl FocusContext {
    pub fn new(stealth: StealthFlag, notifier: Arc<dyn Notifier>) -> Self {
        Self { stealth, notifier }
    }

    /// A context with stealth disarmed and no listeners.
    pub fn detached() -> Self {
        Self::new(StealthFlag::new(false), Arc::new(NullNotifier))
    }
}

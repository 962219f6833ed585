use crate::store::{Action, EditorStore};
use crate::timer::Deadline;
use std::time::{Duration, Instant};

/// Owns the auto-hide timer for the toast kept in the store
#[derive(Debug, Clone)]
pub struct ToastNotifier {
    duration: Duration,
    hide_at: Option<Deadline>,
}

impl ToastNotifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            hide_at: None,
        }
    }

    /// Show a toast; a newer toast replaces the current one and restarts the timer
    pub fn show(
        &mut self,
        store: &mut EditorStore,
        message: impl Into<String>,
        detail: impl Into<String>,
        now: Instant,
    ) {
        store.dispatch(Action::ShowToast {
            message: message.into(),
            detail: detail.into(),
        });
        self.hide_at = Some(Deadline::after(now, self.duration));
    }

    /// Hide the toast once its time is up; returns true when it was hidden
    pub fn tick(&mut self, store: &mut EditorStore, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if deadline.has_passed(now) => {
                self.hide_at = None;
                store.dispatch(Action::HideToast)
            }
            _ => false,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.hide_at.is_some()
    }

    /// Drop the timer without touching the store (unmount)
    pub fn cancel(&mut self) {
        self.hide_at = None;
    }
}

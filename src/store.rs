//! Editor state store.
//!
//! The single source of truth for the overlay. State changes only through
//! [`EditorStore::dispatch`] with one of the closed set of [`Action`]s, and
//! the reducer upholds the lock and transfer invariants on every transition.

use crate::{NodeId, Rectangle, Target};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Interaction mode of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Inactive,
    /// Pick a node and report its identifier
    Select,
    /// Select, resize and move nodes
    Design,
}

impl Mode {
    pub fn is_active(self) -> bool {
        self != Mode::Inactive
    }
}

/// Child-transfer gesture state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferState {
    /// Hold completed; the child follows the pointer
    pub active: bool,
    pub child_node: Option<NodeId>,
    pub child_id: Option<String>,
    /// 0..=100
    pub progress: f32,
    pub started_at: Option<Instant>,
}

impl TransferState {
    /// A hold is in progress but has not armed yet
    pub fn is_scanning(&self) -> bool {
        self.child_node.is_some() && !self.active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToastState {
    pub visible: bool,
    pub message: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorState {
    pub mode: Mode,
    pub hovered: Option<Target>,
    pub selected: Option<Target>,
    pub locked: bool,
    pub transfer: TransferState,
    pub toast: ToastState,
}

impl EditorState {
    /// `hovered` is empty while locked, `selected` is present iff locked,
    /// and progress only lingers while a transfer is under way.
    pub fn invariants_hold(&self) -> bool {
        let lock_ok = !(self.locked && self.hovered.is_some())
            && self.selected.is_some() == self.locked;
        let transfer_ok = self.transfer.child_node.is_some()
            || (self.transfer.progress == 0.0 && !self.transfer.active);
        let armed_ok = !self.transfer.active || self.transfer.progress >= 100.0;
        lock_ok && transfer_ok && armed_ok
    }
}

/// Every way the editor state may change
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `SetMode(Mode::Inactive)` resets everything but the toast
    SetMode(Mode),
    Hover(Option<Target>),
    Select(Target),
    ClearSelection,
    /// Replace the selected box after a re-measure
    RefreshSelection(Rectangle),
    BeginScan {
        child: NodeId,
        child_id: String,
        at: Instant,
    },
    ScanProgress(f32),
    ArmTransfer,
    EndTransfer,
    ShowToast {
        message: String,
        detail: String,
    },
    HideToast,
}

#[derive(Debug, Default)]
pub struct EditorStore {
    state: EditorState,
    /// Number of accepted transitions
    revision: u64,
}

impl EditorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply an action; returns whether the state changed
    pub fn dispatch(&mut self, action: Action) -> bool {
        let before = self.state.clone();
        self.reduce(action);
        debug_assert!(self.state.invariants_hold(), "editor invariants violated");

        let changed = before != self.state;
        if changed {
            self.revision += 1;
        }
        changed
    }

    fn reduce(&mut self, action: Action) {
        let state = &mut self.state;
        match action {
            Action::SetMode(Mode::Inactive) => {
                if state.mode != Mode::Inactive {
                    tracing::debug!(from = ?state.mode, "overlay deactivated");
                }
                let toast = std::mem::take(&mut state.toast);
                *state = EditorState {
                    toast,
                    ..Default::default()
                };
            }
            Action::SetMode(mode) => {
                if state.mode != mode {
                    tracing::debug!(from = ?state.mode, to = ?mode, "mode changed");
                    state.mode = mode;
                    state.hovered = None;
                    state.selected = None;
                    state.locked = false;
                    state.transfer = TransferState::default();
                }
            }
            Action::Hover(target) => {
                if !state.locked && state.mode.is_active() {
                    state.hovered = target;
                }
            }
            Action::Select(target) => {
                if state.mode.is_active() {
                    state.selected = Some(target);
                    state.locked = true;
                    state.hovered = None;
                    state.transfer = TransferState::default();
                }
            }
            Action::ClearSelection => {
                state.selected = None;
                state.locked = false;
                state.transfer = TransferState::default();
            }
            Action::RefreshSelection(bounds) => {
                if let Some(selected) = state.selected.as_mut() {
                    selected.bounds = bounds;
                }
            }
            Action::BeginScan {
                child,
                child_id,
                at,
            } => {
                if state.selected.is_some() && state.transfer.child_node.is_none() {
                    state.transfer = TransferState {
                        active: false,
                        child_node: Some(child),
                        child_id: Some(child_id),
                        progress: 0.0,
                        started_at: Some(at),
                    };
                }
            }
            Action::ScanProgress(progress) => {
                if state.transfer.is_scanning() {
                    state.transfer.progress = progress.clamp(0.0, 100.0);
                }
            }
            Action::ArmTransfer => {
                if state.transfer.is_scanning() && state.transfer.progress >= 100.0 {
                    state.transfer.active = true;
                }
            }
            Action::EndTransfer => {
                state.transfer = TransferState::default();
            }
            Action::ShowToast { message, detail } => {
                state.toast = ToastState {
                    visible: true,
                    message,
                    detail,
                };
            }
            Action::HideToast => {
                state.toast.visible = false;
            }
        }
    }
}

//! Hold-to-confirm child transfer.
//!
//! `Idle → Scanning → Active → Idle`. Scanning is driven by a cancellable
//! interval; the tree is mutated at most once per gesture, on a successful
//! release while `Active`.

use crate::timer::Interval;
use crate::{Document, NodeId, NodeResolver, OverlayConfig, Point};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum TransferPhase {
    Idle,
    Scanning {
        child: NodeId,
        interval: Interval,
        ticks: u32,
    },
    Active {
        child: NodeId,
        pointer: Point,
    },
}

/// Why a gesture ended without moving anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Released before the hold completed
    ReleasedEarly,
    /// The child left the tree mid-gesture
    Detached,
    /// Nothing eligible under the pointer at release
    NoDropTarget,
    /// Dropped onto its current parent
    SameParent,
    /// The tree refused the move
    Rejected,
    /// Mode change or Escape
    Abandoned,
}

/// A completed reparent
#[derive(Debug, Clone, PartialEq)]
pub struct TransferCommit {
    pub child: NodeId,
    pub old_parent: Option<NodeId>,
    pub new_parent: NodeId,
    /// Child identifier before the move
    pub old_id: String,
    /// Child identifier after the move
    pub new_id: String,
    /// Identifier of the drop target
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    Progress(f32),
    Armed,
    Cancelled(CancelReason),
    Committed(TransferCommit),
}

#[derive(Debug, Clone)]
pub struct TransferGesture {
    phase: TransferPhase,
    tick: Duration,
    steps: u32,
}

impl TransferGesture {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            phase: TransferPhase::Idle,
            tick: config.scan_tick(),
            steps: config.scan_steps(),
        }
    }

    pub fn phase(&self) -> &TransferPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TransferPhase::Idle
    }

    pub fn child(&self) -> Option<NodeId> {
        match self.phase {
            TransferPhase::Idle => None,
            TransferPhase::Scanning { child, .. } | TransferPhase::Active { child, .. } => {
                Some(child)
            }
        }
    }

    /// 0..=100
    pub fn progress(&self) -> f32 {
        match self.phase {
            TransferPhase::Idle => 0.0,
            TransferPhase::Scanning { ticks, .. } => self.progress_for(ticks),
            TransferPhase::Active { .. } => 100.0,
        }
    }

    fn progress_for(&self, ticks: u32) -> f32 {
        (ticks as f32 * 100.0 / self.steps as f32).min(100.0)
    }

    /// Start scanning `child`, which must be a strict descendant of `selected`
    pub fn begin(&mut self, doc: &Document, selected: NodeId, child: NodeId, now: Instant) -> bool {
        if !self.is_idle() || !doc.is_attached(child) || !doc.is_descendant_of(child, selected) {
            return false;
        }
        self.phase = TransferPhase::Scanning {
            child,
            interval: Interval::start(now, self.tick),
            ticks: 0,
        };
        tracing::debug!(%child, "transfer scan started");
        true
    }

    /// Advance the scan timer
    pub fn tick(&mut self, doc: &Document, now: Instant) -> Option<TransferEvent> {
        let steps = self.steps;
        let TransferPhase::Scanning {
            child,
            interval,
            ticks,
        } = &mut self.phase
        else {
            return None;
        };

        if !doc.is_attached(*child) {
            self.phase = TransferPhase::Idle;
            return Some(TransferEvent::Cancelled(CancelReason::Detached));
        }

        let fired = interval.poll(now);
        if fired == 0 {
            return None;
        }
        *ticks = ticks.saturating_add(fired);

        if *ticks >= steps {
            let child = *child;
            let pointer = doc.measure(child).map(|b| b.center()).unwrap_or_default();
            self.phase = TransferPhase::Active { child, pointer };
            tracing::debug!(%child, "transfer armed");
            return Some(TransferEvent::Armed);
        }

        let ticks = *ticks;
        Some(TransferEvent::Progress(self.progress_for(ticks)))
    }

    /// Track the pointer while armed
    pub fn pointer_moved(&mut self, point: Point) {
        if let TransferPhase::Active { pointer, .. } = &mut self.phase {
            *pointer = point;
        }
    }

    /// Pointer position while armed
    pub fn pointer(&self) -> Option<Point> {
        match self.phase {
            TransferPhase::Active { pointer, .. } => Some(pointer),
            _ => None,
        }
    }

    /// Finish the gesture at `point`; the only place the tree is mutated
    pub fn release(
        &mut self,
        doc: &mut Document,
        resolver: &NodeResolver,
        point: Point,
    ) -> Option<TransferEvent> {
        match std::mem::replace(&mut self.phase, TransferPhase::Idle) {
            TransferPhase::Idle => None,
            TransferPhase::Scanning { .. } => {
                Some(TransferEvent::Cancelled(CancelReason::ReleasedEarly))
            }
            TransferPhase::Active { child, .. } => Some(Self::drop_child(doc, resolver, child, point)),
        }
    }

    fn drop_child(
        doc: &mut Document,
        resolver: &NodeResolver,
        child: NodeId,
        point: Point,
    ) -> TransferEvent {
        if !doc.is_attached(child) {
            return TransferEvent::Cancelled(CancelReason::Detached);
        }
        let Some(target) = resolver.resolve_at_excluding(doc, point, child) else {
            return TransferEvent::Cancelled(CancelReason::NoDropTarget);
        };

        let old_parent = doc.parent_of(child);
        if old_parent == Some(target.node) {
            return TransferEvent::Cancelled(CancelReason::SameParent);
        }

        let old_id = resolver.identify(doc, child).unwrap_or_default();
        if let Err(e) = doc.append_child(target.node, child) {
            tracing::warn!(%child, error = %e, "transfer rejected by tree");
            return TransferEvent::Cancelled(CancelReason::Rejected);
        }
        let new_id = resolver.identify(doc, child).unwrap_or_default();

        tracing::info!(%child, from = %old_id, to = %new_id, target = %target.stable_id, "node reparented");

        TransferEvent::Committed(TransferCommit {
            child,
            old_parent,
            new_parent: target.node,
            old_id,
            new_id,
            target_id: target.stable_id,
        })
    }

    /// Abandon the gesture without touching the tree
    pub fn cancel(&mut self) -> bool {
        let was_running = !self.is_idle();
        self.phase = TransferPhase::Idle;
        was_running
    }
}

//! Global input listeners for the active mode.
//!
//! The host forwards raw input here; nothing reaches the overlay unless a
//! listener set is bound for the current mode. Drags take a separate,
//! short-lived capture that is released on any pointer-up.

use crate::{Mode, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Character(char),
}

/// Raw input in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove(Point),
    PointerDown {
        position: Point,
        button: PointerButton,
    },
    PointerUp(Point),
    Click(Point),
    ContextMenu(Point),
    KeyDown(Key),
}

impl InputEvent {
    pub fn kind(&self) -> ListenerKind {
        match self {
            InputEvent::PointerMove(_) => ListenerKind::PointerMove,
            InputEvent::PointerDown { .. } => ListenerKind::PointerDown,
            InputEvent::PointerUp(_) => ListenerKind::PointerUp,
            InputEvent::Click(_) => ListenerKind::Click,
            InputEvent::ContextMenu(_) => ListenerKind::ContextMenu,
            InputEvent::KeyDown(_) => ListenerKind::KeyDown,
        }
    }

    pub fn position(&self) -> Option<Point> {
        match *self {
            InputEvent::PointerMove(p)
            | InputEvent::PointerUp(p)
            | InputEvent::Click(p)
            | InputEvent::ContextMenu(p) => Some(p),
            InputEvent::PointerDown { position, .. } => Some(position),
            InputEvent::KeyDown(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    PointerMove,
    PointerDown,
    PointerUp,
    Click,
    ContextMenu,
    KeyDown,
}

/// Capture listeners run before the host's own handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Capture,
    Bubble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener {
    pub kind: ListenerKind,
    pub phase: Phase,
}

/// The listeners bound for one active mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSet {
    mode: Mode,
    listeners: Vec<Listener>,
}

impl ListenerSet {
    pub fn for_mode(mode: Mode) -> Self {
        let listen = |kind, phase| Listener { kind, phase };
        Self {
            mode,
            listeners: vec![
                listen(ListenerKind::PointerMove, Phase::Bubble),
                listen(ListenerKind::PointerDown, Phase::Bubble),
                listen(ListenerKind::PointerUp, Phase::Capture),
                listen(ListenerKind::Click, Phase::Capture),
                listen(ListenerKind::ContextMenu, Phase::Bubble),
                listen(ListenerKind::KeyDown, Phase::Bubble),
            ],
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    pub fn listens_to(&self, kind: ListenerKind) -> bool {
        self.listeners.iter().any(|l| l.kind == kind)
    }
}

/// Which drag currently owns pointer move/up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragCapture {
    Resize,
    Panel(crate::PanelKind),
    Transfer,
}

#[derive(Debug, Default)]
pub struct EventSurface {
    bound: Option<ListenerSet>,
    drag: Option<DragCapture>,
    /// How many times a listener set has been bound
    bind_count: u64,
}

impl EventSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind, rebind or release listeners to match `mode`
    pub fn sync(&mut self, mode: Mode) {
        if !mode.is_active() {
            self.unbind();
            return;
        }
        if self.bound.as_ref().map(ListenerSet::mode) == Some(mode) {
            return;
        }
        // Replace, never stack
        self.drag = None;
        self.bound = Some(ListenerSet::for_mode(mode));
        self.bind_count += 1;
        tracing::debug!(?mode, "listeners bound");
    }

    pub fn unbind(&mut self) {
        self.drag = None;
        if let Some(set) = self.bound.take() {
            tracing::debug!(mode = ?set.mode(), "listeners released");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    pub fn bound(&self) -> Option<&ListenerSet> {
        self.bound.as_ref()
    }

    pub fn bind_count(&self) -> u64 {
        self.bind_count
    }

    pub fn active_listener_count(&self) -> usize {
        self.bound.as_ref().map_or(0, |set| set.listeners().len())
    }

    /// Whether a bound listener would receive this event
    pub fn accepts(&self, event: &InputEvent) -> bool {
        self.bound
            .as_ref()
            .is_some_and(|set| set.listens_to(event.kind()))
    }

    pub fn capture(&mut self, drag: DragCapture) {
        if self.bound.is_some() {
            self.drag = Some(drag);
        }
    }

    pub fn captured(&self) -> Option<DragCapture> {
        self.drag
    }

    pub fn release(&mut self) -> Option<DragCapture> {
        self.drag.take()
    }
}

impl Drop for EventSurface {
    fn drop(&mut self) {
        self.unbind();
    }
}

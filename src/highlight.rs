//! Per-frame overlay composition.
//!
//! Every shape is derived from a fresh measurement of the live node. A node
//! that has left the tree contributes nothing, so a stale highlight can never
//! be painted.

use crate::resize::{handle_rects, Handle, ResizeSession};
use crate::store::EditorState;
use crate::transfer::TransferGesture;
use crate::{Document, NodeResolver, Rectangle, Target};

/// An outlined box with its identifier label
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub bounds: Rectangle,
    pub label: String,
}

/// Hold-to-confirm progress drawn over the scanned child
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanIndicator {
    pub bounds: Rectangle,
    /// 0..=100
    pub progress: f32,
}

/// Dashed outline of the child following the pointer
#[derive(Debug, Clone, PartialEq)]
pub struct DragPreview {
    pub bounds: Rectangle,
    /// Where the child would land if released now
    pub drop_target: Option<Outline>,
}

/// Everything the host paints for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayFrame {
    pub hover: Option<Outline>,
    pub selection: Option<Outline>,
    pub handles: Vec<(Handle, Rectangle)>,
    pub resize_preview: Option<Rectangle>,
    pub scan: Option<ScanIndicator>,
    pub drag_preview: Option<DragPreview>,
}

impl OverlayFrame {
    pub fn is_empty(&self) -> bool {
        *self == OverlayFrame::default()
    }
}

fn outline(doc: &Document, target: &Target) -> Option<Outline> {
    Some(Outline {
        bounds: target.remeasure(doc)?,
        label: target.stable_id.clone(),
    })
}

pub struct HighlightRenderer {
    handle_size: f32,
}

impl HighlightRenderer {
    pub fn new(handle_size: f32) -> Self {
        Self { handle_size }
    }

    pub fn compose(
        &self,
        doc: &Document,
        state: &EditorState,
        resolver: &NodeResolver,
        resize: Option<&ResizeSession>,
        transfer: &TransferGesture,
    ) -> OverlayFrame {
        let mut frame = OverlayFrame::default();
        if !state.mode.is_active() {
            return frame;
        }

        frame.hover = state.hovered.as_ref().and_then(|t| outline(doc, t));
        frame.selection = state.selected.as_ref().and_then(|t| outline(doc, t));

        if let Some(selection) = &frame.selection {
            // Handles track the preview while a resize is under way
            let handle_box = resize
                .filter(|session| doc.is_attached(session.node()))
                .map(|session| session.preview())
                .unwrap_or(selection.bounds);
            frame.handles = handle_rects(&handle_box, self.handle_size);
            frame.resize_preview = resize
                .filter(|session| doc.is_attached(session.node()))
                .map(|session| session.preview());
        }

        let Some(child) = transfer.child() else {
            return frame;
        };
        let Some(child_bounds) = doc.measure(child) else {
            return frame;
        };

        match transfer.pointer() {
            None => {
                frame.scan = Some(ScanIndicator {
                    bounds: child_bounds,
                    progress: transfer.progress(),
                });
            }
            Some(pointer) => {
                let bounds = Rectangle::new(
                    pointer.x - child_bounds.width / 2.0,
                    pointer.y - child_bounds.height / 2.0,
                    child_bounds.width,
                    child_bounds.height,
                );
                let drop_target = resolver
                    .resolve_at_excluding(doc, pointer, child)
                    .and_then(|t| outline(doc, &t));
                frame.drag_preview = Some(DragPreview {
                    bounds,
                    drop_target,
                });
            }
        }

        frame
    }
}

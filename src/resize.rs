//! Handle-drag resizing with proportional child scaling.
//!
//! During a drag only the preview rectangle changes; the node itself is
//! resized once, on release, and then re-measured.

use crate::{Document, NodeId, Point, Rectangle};
use anyhow::{anyhow, Result};

/// One of the eight compass-point grab handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Handle {
    /// Corners first so they win where they overlap edge handles
    pub const ALL: [Handle; 8] = [
        Handle::NW,
        Handle::NE,
        Handle::SW,
        Handle::SE,
        Handle::N,
        Handle::S,
        Handle::W,
        Handle::E,
    ];

    fn moves_north(self) -> bool {
        matches!(self, Handle::N | Handle::NE | Handle::NW)
    }

    fn moves_south(self) -> bool {
        matches!(self, Handle::S | Handle::SE | Handle::SW)
    }

    fn moves_east(self) -> bool {
        matches!(self, Handle::E | Handle::NE | Handle::SE)
    }

    fn moves_west(self) -> bool {
        matches!(self, Handle::W | Handle::NW | Handle::SW)
    }

    /// Where the handle sits on `bounds`
    pub fn anchor(self, bounds: &Rectangle) -> Point {
        let center = bounds.center();
        let x = if self.moves_west() {
            bounds.x
        } else if self.moves_east() {
            bounds.right()
        } else {
            center.x
        };
        let y = if self.moves_north() {
            bounds.y
        } else if self.moves_south() {
            bounds.bottom()
        } else {
            center.y
        };
        Point::new(x, y)
    }

    /// Cursor hint for the host
    pub fn cursor(self) -> &'static str {
        match self {
            Handle::N | Handle::S => "ns-resize",
            Handle::E | Handle::W => "ew-resize",
            Handle::NE | Handle::SW => "nesw-resize",
            Handle::NW | Handle::SE => "nwse-resize",
        }
    }
}

/// Hit areas of all eight handles
pub fn handle_rects(bounds: &Rectangle, handle_size: f32) -> Vec<(Handle, Rectangle)> {
    Handle::ALL
        .iter()
        .map(|handle| (*handle, Rectangle::centered(handle.anchor(bounds), handle_size)))
        .collect()
}

/// Get the resize handle at the given position, if any
pub fn handle_at(bounds: &Rectangle, point: Point, handle_size: f32) -> Option<Handle> {
    handle_rects(bounds, handle_size)
        .into_iter()
        .find(|(_, rect)| rect.contains_point(point))
        .map(|(handle, _)| handle)
}

/// Candidate box for a drag of `(dx, dy)` from `start` on `handle`
///
/// Both dimensions are clamped to `min_size`; north and west drags keep the
/// opposite edge fixed.
pub fn resize_candidate(
    start: Rectangle,
    handle: Handle,
    dx: f32,
    dy: f32,
    min_size: f32,
) -> Rectangle {
    let width = if handle.moves_east() {
        start.width + dx
    } else if handle.moves_west() {
        start.width - dx
    } else {
        start.width
    };
    let height = if handle.moves_south() {
        start.height + dy
    } else if handle.moves_north() {
        start.height - dy
    } else {
        start.height
    };

    // Both dimensions honour the minimum, even the one the handle leaves alone
    let width = width.max(min_size);
    let height = height.max(min_size);

    Rectangle {
        x: if handle.moves_west() {
            start.right() - width
        } else {
            start.x
        },
        y: if handle.moves_north() {
            start.bottom() - height
        } else {
            start.y
        },
        width,
        height,
    }
}

/// A direct child's size relative to its parent at drag start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildRatio {
    pub node: NodeId,
    pub width_ratio: f32,
    pub height_ratio: f32,
}

/// An in-flight handle drag
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    node: NodeId,
    handle: Handle,
    start_pointer: Point,
    start_bounds: Rectangle,
    children: Vec<ChildRatio>,
    preview: Rectangle,
    min_size: f32,
}

impl ResizeSession {
    /// Start a drag with a fresh measurement of `node` and its children
    pub fn begin(
        doc: &Document,
        node: NodeId,
        handle: Handle,
        pointer: Point,
        min_size: f32,
    ) -> Option<Self> {
        let start_bounds = doc.measure(node)?;

        let children = doc
            .children_of(node)
            .iter()
            .filter(|child| doc.get(**child).is_some_and(|n| !n.overlay))
            .filter_map(|child| {
                let child_bounds = doc.measure(*child)?;
                Some(ChildRatio {
                    node: *child,
                    width_ratio: ratio(child_bounds.width, start_bounds.width),
                    height_ratio: ratio(child_bounds.height, start_bounds.height),
                })
            })
            .collect();

        tracing::debug!(%node, ?handle, "resize started");

        Some(Self {
            node,
            handle,
            start_pointer: pointer,
            start_bounds,
            children,
            preview: start_bounds,
            min_size,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn start_bounds(&self) -> Rectangle {
        self.start_bounds
    }

    pub fn children(&self) -> &[ChildRatio] {
        &self.children
    }

    pub fn preview(&self) -> Rectangle {
        self.preview
    }

    /// Update the preview for the current pointer; the tree is untouched
    pub fn drag(&mut self, pointer: Point) -> Rectangle {
        self.preview = resize_candidate(
            self.start_bounds,
            self.handle,
            pointer.x - self.start_pointer.x,
            pointer.y - self.start_pointer.y,
            self.min_size,
        );
        self.preview
    }

    /// Apply the final size, re-measure and rescale direct children
    ///
    /// Returns the node's re-measured box.
    pub fn commit(mut self, doc: &mut Document, pointer: Point) -> Result<Rectangle> {
        let requested = self.drag(pointer);
        if !doc.is_attached(self.node) {
            return Err(anyhow!("Node left the tree during resize: {}", self.node));
        }

        let measured = doc.set_size(self.node, requested.width, requested.height)?;

        for child in &self.children {
            if !doc.is_attached(child.node) {
                continue;
            }
            doc.set_size(
                child.node,
                child.width_ratio * measured.width,
                child.height_ratio * measured.height,
            )?;
        }

        tracing::debug!(
            node = %self.node,
            width = measured.width,
            height = measured.height,
            children = self.children.len(),
            "resize committed"
        );

        Ok(measured)
    }
}

fn ratio(part: f32, whole: f32) -> f32 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

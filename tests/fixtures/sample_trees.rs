// Builders for documents used across the integration tests

#![allow(dead_code)]

use live_inspector::{Document, Node, NodeId, Rectangle};

pub const VIEWPORT: Rectangle = Rectangle {
    x: 0.0,
    y: 0.0,
    width: 1000.0,
    height: 800.0,
};

/// A registered region with a chain of nested descendants
///
/// `levels` nodes are nested below the region, each inset by 10 on every side.
pub fn registered_region(levels: usize) -> (Document, NodeId, Vec<NodeId>) {
    let mut doc = Document::new(VIEWPORT);
    let root = doc.root();
    let main = doc
        .insert(root, Node::new("main", Rectangle::new(0.0, 0.0, 1000.0, 800.0)))
        .unwrap();
    let region = doc
        .insert(
            main,
            Node::new("section", Rectangle::new(100.0, 100.0, 400.0, 400.0))
                .with_attribute("data-registry-id", "hero"),
        )
        .unwrap();

    let mut descendants = Vec::new();
    let mut parent = region;
    for level in 1..=levels {
        let inset = level as f32 * 10.0;
        let node = doc
            .insert(
                parent,
                Node::new(
                    "div",
                    Rectangle::new(100.0 + inset, 100.0 + inset, 400.0 - 2.0 * inset, 400.0 - 2.0 * inset),
                ),
            )
            .unwrap();
        descendants.push(node);
        parent = node;
    }

    doc.clear_events();
    (doc, region, descendants)
}

/// A 100x100 parent holding one 50x50 child
pub fn parent_with_child() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new(VIEWPORT);
    let root = doc.root();
    let parent = doc
        .insert(
            root,
            Node::new("div", Rectangle::new(100.0, 100.0, 100.0, 100.0))
                .with_attribute("data-registry-id", "box"),
        )
        .unwrap();
    let child = doc
        .create_node(parent, "span", Rectangle::new(110.0, 110.0, 50.0, 50.0))
        .unwrap();
    doc.clear_events();
    (doc, parent, child)
}

/// Two registered columns; the left one holds a movable card
pub struct Columns {
    pub doc: Document,
    pub left: NodeId,
    pub right: NodeId,
    pub card: NodeId,
}

pub fn two_columns() -> Columns {
    let mut doc = Document::new(VIEWPORT);
    let root = doc.root();
    let left = doc
        .insert(
            root,
            Node::new("div", Rectangle::new(0.0, 0.0, 400.0, 600.0))
                .with_attribute("data-registry-id", "col-left"),
        )
        .unwrap();
    let right = doc
        .insert(
            root,
            Node::new("div", Rectangle::new(500.0, 0.0, 400.0, 600.0))
                .with_attribute("data-registry-id", "col-right"),
        )
        .unwrap();
    let card = doc
        .insert(
            left,
            Node::new("article", Rectangle::new(20.0, 20.0, 200.0, 100.0))
                .with_attribute("data-registry-id", "card"),
        )
        .unwrap();
    doc.clear_events();
    Columns {
        doc,
        left,
        right,
        card,
    }
}

use crate::Rectangle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use ulid::Ulid;

/// Handle to a node in a [`Document`](crate::Document)
///
/// Handles stay valid after a node is detached; geometry reads against a
/// detached node return `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Ulid);

impl NodeId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rendered element in the live tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: NodeId,

    /// Lowercase element tag, e.g. `div`
    pub tag: String,

    /// The element's `id` attribute
    pub dom_id: Option<String>,

    pub classes: Vec<String>,

    /// Arbitrary attributes, including the registry annotation
    pub attributes: BTreeMap<String, String>,

    /// Inline style properties (`width`, `color`, ...)
    pub style: BTreeMap<String, String>,

    pub text: String,

    /// Measured box in screen coordinates
    pub bounds: Rectangle,

    /// Layout minimums; a requested size below these is clamped
    pub min_width: f32,
    pub min_height: f32,

    /// Belongs to the inspector overlay itself and is never resolved
    pub overlay: bool,

    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create a new node with the given tag and box
    pub fn new(tag: impl Into<String>, bounds: Rectangle) -> Self {
        Self {
            id: NodeId::new(),
            tag: tag.into().to_ascii_lowercase(),
            dom_id: None,
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            text: String::new(),
            bounds,
            min_width: 0.0,
            min_height: 0.0,
            overlay: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_dom_id(mut self, dom_id: impl Into<String>) -> Self {
        self.dom_id = Some(dom_id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_min_size(mut self, min_width: f32, min_height: f32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    /// Mark the node as part of the overlay
    pub fn as_overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class; returns false if it was already present
    pub fn add_class(&mut self, class: String) -> bool {
        if self.has_class(&class) {
            return false;
        }
        self.classes.push(class);
        true
    }

    /// Remove a class; returns false if it was not present
    pub fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        self.classes.len() != before
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Add a child node, keeping it last
    pub fn add_child(&mut self, child_id: NodeId) {
        self.children.retain(|c| *c != child_id);
        self.children.push(child_id);
    }

    pub fn remove_child(&mut self, child_id: NodeId) {
        self.children.retain(|c| *c != child_id);
    }

    pub fn set_parent(&mut self, parent_id: Option<NodeId>) {
        self.parent = parent_id;
    }
}

//! Node resolution: from a screen coordinate (or a node) to a stable identifier.
//!
//! Hit-testing queries every node stacked under the point rather than the
//! top-most one, so nodes behind overlay layers stay reachable. Registry
//! annotations placed by the host application take priority over a
//! synthesized structural selector.

use crate::{Document, NodeId, OverlayConfig, Point, Rectangle};
use serde::{Deserialize, Serialize};

const ROOT_CONTAINER_TAGS: &[&str] = &["html", "body"];
const ROOT_CONTAINER_ID: &str = "root";

/// A resolved node with its identifier and freshly measured box
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub node: NodeId,
    pub stable_id: String,
    pub bounds: Rectangle,
}

impl Target {
    /// Measure the node again; `None` once it has left the tree
    pub fn remeasure(&self, doc: &Document) -> Option<Rectangle> {
        doc.measure(self.node)
    }
}

/// Descriptive details sent along with a selection report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    pub tag: String,
    pub classes: Vec<String>,
    pub id: Option<String>,
    pub text_snippet: String,
}

#[derive(Debug, Clone)]
pub struct NodeResolver {
    registry_attribute: String,
    max_ancestor_depth: usize,
    text_snippet_len: usize,
}

impl NodeResolver {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            registry_attribute: config.registry_attribute.clone(),
            max_ancestor_depth: config.max_ancestor_depth,
            text_snippet_len: config.text_snippet_len,
        }
    }

    pub fn registry_attribute(&self) -> &str {
        &self.registry_attribute
    }

    /// Resolve the node under `point`
    pub fn resolve_at(&self, doc: &Document, point: Point) -> Option<Target> {
        self.resolve_filtered(doc, point, |_| true)
    }

    /// Resolve the node under `point`, ignoring `excluded` and its subtree
    ///
    /// Used while a dragged node follows the pointer.
    pub fn resolve_at_excluding(
        &self,
        doc: &Document,
        point: Point,
        excluded: NodeId,
    ) -> Option<Target> {
        self.resolve_filtered(doc, point, |id| {
            id != excluded && !doc.is_descendant_of(id, excluded)
        })
    }

    fn resolve_filtered(
        &self,
        doc: &Document,
        point: Point,
        allow: impl Fn(NodeId) -> bool,
    ) -> Option<Target> {
        let candidates: Vec<NodeId> = doc
            .nodes_at_point(point)
            .into_iter()
            .filter(|id| allow(*id) && self.is_eligible(doc, *id))
            .collect();

        // Overlapping registered siblings: first match in stacking order wins
        for candidate in &candidates {
            if let Some((node, stable_id)) = self.registry_ancestor(doc, *candidate) {
                let bounds = doc.measure(node)?;
                return Some(Target {
                    node,
                    stable_id,
                    bounds,
                });
            }
        }

        let first = *candidates.first()?;
        Some(Target {
            node: first,
            stable_id: structural_selector(doc, first)?,
            bounds: doc.measure(first)?,
        })
    }

    /// Resolve a known node without hit-testing
    pub fn resolve_node(&self, doc: &Document, id: NodeId) -> Option<Target> {
        if !self.is_eligible(doc, id) {
            return None;
        }
        let (node, stable_id) = self
            .registry_ancestor(doc, id)
            .or_else(|| structural_selector(doc, id).map(|selector| (id, selector)))?;
        Some(Target {
            node,
            stable_id,
            bounds: doc.measure(node)?,
        })
    }

    /// Nearest annotated node among `id` and its first ancestors
    pub fn registry_ancestor(&self, doc: &Document, id: NodeId) -> Option<(NodeId, String)> {
        let mut current = Some(id);
        for _ in 0..=self.max_ancestor_depth {
            let node_id = current?;
            if is_root_container(doc, node_id) {
                return None;
            }
            let node = doc.get(node_id)?;
            if let Some(value) = node.attribute(&self.registry_attribute) {
                if !value.is_empty() {
                    return Some((node_id, value.to_string()));
                }
            }
            current = node.parent;
        }
        None
    }

    /// Registry annotation carried by the node itself
    pub fn annotation(&self, doc: &Document, id: NodeId) -> Option<String> {
        doc.attribute(id, &self.registry_attribute)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Identifier of the node itself: its own annotation, else its selector
    pub fn identify(&self, doc: &Document, id: NodeId) -> Option<String> {
        self.annotation(doc, id)
            .or_else(|| structural_selector(doc, id))
    }

    pub fn element_info(&self, doc: &Document, id: NodeId) -> Option<ElementInfo> {
        let node = doc.get(id)?;
        Some(ElementInfo {
            tag: node.tag.clone(),
            classes: node.classes.clone(),
            id: node.dom_id.clone(),
            text_snippet: node
                .text
                .trim()
                .chars()
                .take(self.text_snippet_len)
                .collect(),
        })
    }

    fn is_eligible(&self, doc: &Document, id: NodeId) -> bool {
        match doc.get(id) {
            Some(node) => !node.overlay && !is_root_container(doc, id) && doc.is_attached(id),
            None => false,
        }
    }
}

/// `html`, `body`, the document root and the application mount point
pub fn is_root_container(doc: &Document, id: NodeId) -> bool {
    if id == doc.root() {
        return true;
    }
    doc.get(id).is_some_and(|node| {
        ROOT_CONTAINER_TAGS.contains(&node.tag.as_str())
            || node.dom_id.as_deref() == Some(ROOT_CONTAINER_ID)
    })
}

/// Structural selector for a node, e.g. `section#main > ul > li:nth-of-type(2)`
///
/// Walks up until an element id (assumed unique) or a root container.
pub fn structural_selector(doc: &Document, id: NodeId) -> Option<String> {
    let mut segments = Vec::new();
    let mut current = Some(id);

    while let Some(node_id) = current {
        if is_root_container(doc, node_id) {
            break;
        }
        let node = doc.get(node_id)?;
        if let Some(dom_id) = &node.dom_id {
            segments.push(format!("{}#{}", node.tag, dom_id));
            break;
        }

        let mut segment = node.tag.clone();
        if let Some(parent) = node.parent {
            let same_tag: Vec<NodeId> = doc
                .children_of(parent)
                .iter()
                .copied()
                .filter(|sibling| doc.get(*sibling).is_some_and(|s| s.tag == node.tag))
                .collect();
            if same_tag.len() > 1 {
                if let Some(index) = same_tag.iter().position(|s| *s == node_id) {
                    segment.push_str(&format!(":nth-of-type({})", index + 1));
                }
            }
        }
        segments.push(segment);
        current = node.parent;
    }

    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(segments.join(" > "))
}

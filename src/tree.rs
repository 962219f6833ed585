use crate::{EventType, Node, NodeId, Point, Rectangle, TreeEvent};
use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// Inset used when flowing a reparented node into its new parent
const FLOW_INSET: f32 = 8.0;

/// The live rendered tree the overlay inspects and edits
#[derive(Debug, Clone)]
pub struct Document {
    /// All nodes indexed by ID, attached or not
    nodes: HashMap<NodeId, Node>,

    /// The `body` container
    root: NodeId,

    /// Event log for mutation history
    events: Vec<TreeEvent>,
}

impl Document {
    /// Create a document whose `body` covers `root_bounds`
    pub fn new(root_bounds: Rectangle) -> Self {
        let root = Node::new("body", root_bounds);
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);

        Self {
            nodes,
            root: root_id,
            events: Vec::new(),
        }
    }

    // ========== Node CRUD ==========

    /// Insert a prepared node as the last child of `parent`
    pub fn insert(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or_else(|| anyhow!("Parent node not found: {}", parent))?;

        let id = node.id;
        parent_node.add_child(id);
        node.set_parent(Some(parent));
        node.children.clear();

        self.log_event(EventType::NodeCreated {
            id,
            parent: Some(parent),
            tag: node.tag.clone(),
            bounds: node.bounds,
        });

        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Create a plain node and append it to `parent`
    pub fn create_node(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
        bounds: Rectangle,
    ) -> Result<NodeId> {
        self.insert(parent, Node::new(tag, bounds))
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// True when the node exists and its parent chain reaches the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        // A well-formed chain is never longer than the arena
        for _ in 0..=self.nodes.len() {
            if current == self.root {
                return true;
            }
            match self.parent_of(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Strict descendant check: a node is not its own descendant
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent_of(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Detach a node (and its subtree) from the tree
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(anyhow!("Cannot remove the root container"));
        }
        let parent = self
            .nodes
            .get(&id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?
            .parent;

        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                parent_node.remove_child(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.set_parent(None);
        }

        self.log_event(EventType::NodeRemoved { id });
        Ok(())
    }

    // ========== Geometry ==========

    /// Fresh geometry for an attached node
    pub fn measure(&self, id: NodeId) -> Option<Rectangle> {
        if !self.is_attached(id) {
            return None;
        }
        self.nodes.get(&id).map(|n| n.bounds)
    }

    /// Every attached node whose box contains `point`, front-to-back
    ///
    /// Later siblings paint over earlier ones and children over parents.
    /// Overlay nodes are painted above the whole document.
    pub fn nodes_at_point(&self, point: Point) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.paint_order(self.root, &mut order);

        let (overlay, document): (Vec<NodeId>, Vec<NodeId>) = order
            .into_iter()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| n.bounds.contains_point(point))
            })
            .partition(|id| self.nodes.get(id).is_some_and(|n| n.overlay));

        overlay
            .into_iter()
            .rev()
            .chain(document.into_iter().rev())
            .collect()
    }

    fn paint_order(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        out.push(id);
        for child in &node.children {
            self.paint_order(*child, out);
        }
    }

    /// Apply a size and return the re-measured box
    ///
    /// Layout minimums win over the requested size.
    pub fn set_size(&mut self, id: NodeId, width: f32, height: f32) -> Result<Rectangle> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;

        let old_bounds = node.bounds;
        node.bounds.width = width.max(node.min_width).max(0.0);
        node.bounds.height = height.max(node.min_height).max(0.0);
        let new_bounds = node.bounds;
        node.style
            .insert("width".to_string(), format!("{}px", new_bounds.width));
        node.style
            .insert("height".to_string(), format!("{}px", new_bounds.height));

        self.log_event(EventType::NodeResized {
            id,
            old_bounds,
            new_bounds,
        });

        Ok(new_bounds)
    }

    /// Move a node and its whole subtree
    pub fn translate(&mut self, id: NodeId, dx: f32, dy: f32) -> Result<()> {
        if !self.nodes.contains_key(&id) {
            return Err(anyhow!("Node not found: {}", id));
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(&current) {
                node.bounds = node.bounds.translated(dx, dy);
                stack.extend(node.children.iter().copied());
            }
        }

        self.log_event(EventType::NodeMoved { id, dx, dy });
        Ok(())
    }

    // ========== Structure ==========

    /// Move `child` to become the last child of `new_parent`
    ///
    /// The child's subtree is flowed below the new parent's existing content.
    pub fn append_child(&mut self, new_parent: NodeId, child: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&new_parent) {
            return Err(anyhow!("Parent node not found: {}", new_parent));
        }
        if !self.nodes.contains_key(&child) {
            return Err(anyhow!("Node not found: {}", child));
        }
        if child == self.root {
            return Err(anyhow!("Cannot move the root container"));
        }
        if child == new_parent || self.is_descendant_of(new_parent, child) {
            return Err(anyhow!("Cannot move a node into its own subtree"));
        }

        let anchor = self.flow_anchor(new_parent, child);
        let old_parent = self.parent_of(child);

        if let Some(old_id) = old_parent {
            if let Some(old_node) = self.nodes.get_mut(&old_id) {
                old_node.remove_child(child);
            }
        }
        if let Some(parent_node) = self.nodes.get_mut(&new_parent) {
            parent_node.add_child(child);
        }
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.set_parent(Some(new_parent));
        }

        self.log_event(EventType::NodeReparented {
            id: child,
            old_parent,
            new_parent,
        });

        if let (Some(anchor), Some(bounds)) = (anchor, self.nodes.get(&child).map(|n| n.bounds)) {
            self.translate(child, anchor.x - bounds.x, anchor.y - bounds.y)?;
        }

        Ok(())
    }

    /// Where a node appended to `parent` should start
    fn flow_anchor(&self, parent: NodeId, incoming: NodeId) -> Option<Point> {
        let parent_bounds = self.nodes.get(&parent)?.bounds;
        let below_last = self
            .children_of(parent)
            .iter()
            .filter(|id| **id != incoming)
            .filter_map(|id| self.nodes.get(id))
            .map(|n| n.bounds.bottom())
            .fold(None, |acc: Option<f32>, bottom| {
                Some(acc.map_or(bottom, |a| a.max(bottom)))
            });

        let y = below_last.unwrap_or(parent_bounds.y) + FLOW_INSET;
        Some(Point::new(parent_bounds.x + FLOW_INSET, y))
    }

    // ========== Style, classes and attributes ==========

    pub fn set_style(&mut self, id: NodeId, property: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;
        node.style.insert(property.to_string(), value.clone());

        self.log_event(EventType::StyleChanged {
            id,
            property: property.to_string(),
            value: Some(value),
        });
        Ok(())
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.nodes
            .get(&id)
            .and_then(|n| n.style.get(property))
            .map(String::as_str)
    }

    /// Add a class; `Ok(false)` when it was already present
    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<bool> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;
        let changed = node.add_class(class.to_string());
        if changed {
            self.log_event(EventType::ClassChanged {
                id,
                class: class.to_string(),
                present: true,
            });
        }
        Ok(changed)
    }

    /// Remove a class; `Ok(false)` when it was not present
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<bool> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;
        let changed = node.remove_class(class);
        if changed {
            self.log_event(EventType::ClassChanged {
                id,
                class: class.to_string(),
                present: false,
            });
        }
        Ok(changed)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.has_class(class))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;
        node.attributes.insert(name.to_string(), value.clone());

        self.log_event(EventType::AttributeChanged {
            id,
            name: name.to_string(),
            value: Some(value),
        });
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Node not found: {}", id))?;
        if node.attributes.remove(name).is_some() {
            self.log_event(EventType::AttributeChanged {
                id,
                name: name.to_string(),
                value: None,
            });
        }
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(&id).and_then(|n| n.attribute(name))
    }

    // ========== Event Logging ==========

    fn log_event(&mut self, event: EventType) {
        self.events.push(TreeEvent::new(event));
    }

    pub fn events(&self) -> &[TreeEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Count nodes, detached ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Attached nodes in paint order, root first
    pub fn attached_nodes(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.paint_order(self.root, &mut order);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_two_boxes() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new(Rectangle::new(0.0, 0.0, 800.0, 600.0));
        let root = doc.root();
        let a = doc
            .create_node(root, "div", Rectangle::new(0.0, 0.0, 200.0, 200.0))
            .unwrap();
        let b = doc
            .create_node(a, "span", Rectangle::new(10.0, 10.0, 50.0, 20.0))
            .unwrap();
        (doc, a, b)
    }

    #[test]
    fn test_document_creation() {
        let doc = Document::new(Rectangle::new(0.0, 0.0, 800.0, 600.0));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.get(doc.root()).unwrap().tag, "body");
        assert!(doc.is_attached(doc.root()));
    }

    #[test]
    fn test_hit_testing_is_front_to_back() {
        let (doc, a, b) = doc_with_two_boxes();
        let hits = doc.nodes_at_point(Point::new(20.0, 15.0));
        assert_eq!(hits, vec![b, a, doc.root()]);

        let hits = doc.nodes_at_point(Point::new(150.0, 150.0));
        assert_eq!(hits, vec![a, doc.root()]);
    }

    #[test]
    fn test_overlay_nodes_are_in_front() {
        let (mut doc, _a, b) = doc_with_two_boxes();
        let root = doc.root();
        let veil = doc
            .insert(
                root,
                Node::new("div", Rectangle::new(0.0, 0.0, 800.0, 600.0)).as_overlay(),
            )
            .unwrap();

        let hits = doc.nodes_at_point(Point::new(20.0, 15.0));
        assert_eq!(hits[0], veil);
        assert_eq!(hits[1], b);
    }

    #[test]
    fn test_removed_nodes_are_detached() {
        let (mut doc, a, b) = doc_with_two_boxes();
        doc.remove(a).unwrap();

        assert!(!doc.is_attached(a));
        assert!(!doc.is_attached(b));
        assert_eq!(doc.measure(b), None);
        assert_eq!(doc.nodes_at_point(Point::new(20.0, 15.0)), vec![doc.root()]);
        assert!(doc.remove(doc.root()).is_err());
    }

    #[test]
    fn test_set_size_respects_layout_minimums() {
        let (mut doc, a, _b) = doc_with_two_boxes();
        let root = doc.root();
        let stubborn = doc
            .insert(
                root,
                Node::new("p", Rectangle::new(300.0, 0.0, 100.0, 100.0)).with_min_size(60.0, 0.0),
            )
            .unwrap();

        let measured = doc.set_size(stubborn, 30.0, 40.0).unwrap();
        assert_eq!(measured.width, 60.0);
        assert_eq!(measured.height, 40.0);

        let measured = doc.set_size(a, 120.0, 80.0).unwrap();
        assert_eq!(measured, Rectangle::new(0.0, 0.0, 120.0, 80.0));
        assert_eq!(doc.style(a, "width"), Some("120px"));
    }

    #[test]
    fn test_append_child_moves_structure_once() {
        let (mut doc, a, b) = doc_with_two_boxes();
        let root = doc.root();
        let target = doc
            .create_node(root, "section", Rectangle::new(300.0, 300.0, 200.0, 200.0))
            .unwrap();

        doc.append_child(target, b).unwrap();

        assert_eq!(doc.parent_of(b), Some(target));
        assert!(doc.children_of(a).is_empty());
        assert_eq!(doc.children_of(target), &[b]);
        let moved = doc.measure(b).unwrap();
        assert_eq!((moved.x, moved.y), (308.0, 308.0));
    }

    #[test]
    fn test_append_child_rejects_cycles() {
        let (mut doc, a, b) = doc_with_two_boxes();
        assert!(doc.append_child(b, a).is_err());
        assert!(doc.append_child(a, a).is_err());
        assert!(doc.append_child(a, doc.root()).is_err());
        assert_eq!(doc.parent_of(b), Some(a));
    }

    #[test]
    fn test_descendant_checks() {
        let (doc, a, b) = doc_with_two_boxes();
        assert!(doc.is_descendant_of(b, a));
        assert!(doc.is_descendant_of(b, doc.root()));
        assert!(!doc.is_descendant_of(a, b));
        assert!(!doc.is_descendant_of(a, a));
    }

    #[test]
    fn test_class_and_attribute_events() {
        let (mut doc, a, _b) = doc_with_two_boxes();
        doc.clear_events();

        assert!(doc.add_class(a, "hover").unwrap());
        assert!(!doc.add_class(a, "hover").unwrap());
        assert!(doc.has_class(a, "hover"));
        assert!(doc.remove_class(a, "hover").unwrap());

        doc.set_attribute(a, "data-x", "1").unwrap();
        assert_eq!(doc.attribute(a, "data-x"), Some("1"));
        doc.remove_attribute(a, "data-x").unwrap();
        assert_eq!(doc.attribute(a, "data-x"), None);

        assert_eq!(doc.events().len(), 4);
    }
}

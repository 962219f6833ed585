use crate::{NodeId, Rectangle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tree mutation with timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEvent {
    pub timestamp: DateTime<Utc>,
    pub event: EventType,
}

impl TreeEvent {
    /// Create a new event with the current timestamp
    pub fn new(event: EventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }

    /// Create a new event with a specific timestamp
    pub fn with_timestamp(timestamp: DateTime<Utc>, event: EventType) -> Self {
        Self { timestamp, event }
    }
}

/// Mutations that can be applied to the live tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EventType {
    NodeCreated {
        id: NodeId,
        parent: Option<NodeId>,
        tag: String,
        bounds: Rectangle,
    },

    NodeResized {
        id: NodeId,
        old_bounds: Rectangle,
        new_bounds: Rectangle,
    },

    NodeMoved {
        id: NodeId,
        dx: f32,
        dy: f32,
    },

    NodeReparented {
        id: NodeId,
        old_parent: Option<NodeId>,
        new_parent: NodeId,
    },

    NodeRemoved {
        id: NodeId,
    },

    StyleChanged {
        id: NodeId,
        property: String,
        value: Option<String>,
    },

    ClassChanged {
        id: NodeId,
        class: String,
        present: bool,
    },

    AttributeChanged {
        id: NodeId,
        name: String,
        value: Option<String>,
    },
}

impl EventType {
    /// Structural events change parent/child links
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EventType::NodeCreated { .. }
                | EventType::NodeReparented { .. }
                | EventType::NodeRemoved { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = TreeEvent::new(EventType::NodeCreated {
            id: NodeId::new(),
            parent: None,
            tag: "div".to_string(),
            bounds: Rectangle::new(0.0, 0.0, 100.0, 100.0),
        });

        assert!(event.timestamp <= Utc::now());
        assert!(event.event.is_structural());
    }

    #[test]
    fn test_event_serialization() {
        let id = NodeId::new();
        let new_parent = NodeId::new();
        let event = TreeEvent::new(EventType::NodeReparented {
            id,
            old_parent: None,
            new_parent,
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: TreeEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(event.event, deserialized.event);
    }

    #[test]
    fn test_style_change_is_not_structural() {
        let event = EventType::StyleChanged {
            id: NodeId::new(),
            property: "color".to_string(),
            value: Some("#fff".to_string()),
        };
        assert!(!event.is_structural());
    }
}

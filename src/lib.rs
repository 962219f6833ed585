// Live Inspector - Core Library

pub mod clipboard;
pub mod config;
pub mod demo;
pub mod event;
pub mod geometry;
pub mod handshake;
pub mod highlight;
pub mod hover;
pub mod node;
pub mod overlay;
pub mod panels;
pub mod resize;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod surface;
pub mod timer;
pub mod toast;
pub mod transfer;
pub mod tree;
pub mod ui;

// Re-export main types for convenience
pub use clipboard::{ClipboardSink, MemoryClipboard, SystemClipboard};
pub use config::OverlayConfig;
pub use event::{EventType, TreeEvent};
pub use geometry::{Point, Rectangle};
pub use handshake::{
    ActivationRequest, OpenerChannel, OpenerMessage, OutboundMessage, RecordingOpener,
    SelectionReport, StoredSelection,
};
pub use highlight::{DragPreview, HighlightRenderer, Outline, OverlayFrame, ScanIndicator};
pub use node::{Node, NodeId};
pub use overlay::Overlay;
pub use panels::{DragAxis, FieldValue, FloatingPanel, InspectorField, PanelKind, ToolbarAction};
pub use resize::{Handle, ResizeSession};
pub use resolver::{ElementInfo, NodeResolver, Target};
pub use storage::{EventJournal, JsonFileStorage, MemoryStorage, SelectionStorage};
pub use store::{Action, EditorState, EditorStore, Mode};
pub use surface::{EventSurface, InputEvent, Key, PointerButton};
pub use transfer::{CancelReason, TransferEvent, TransferGesture};
pub use tree::Document;
pub use ui::LiveInspectorApp;

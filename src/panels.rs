//! Floating toolbar and inspector panels.
//!
//! Both panels are drag-repositionable from anywhere except their
//! interactive controls. The inspector also parses and validates the
//! property values an operator types in.

use crate::{Document, NodeId, Point, Rectangle};
use anyhow::{anyhow, Result};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Toolbar,
    Inspector,
}

/// How a panel may move when dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAxis {
    Free,
    /// Horizontal only, kept inside the viewport width
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanelDrag {
    grab_offset: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingPanel {
    kind: PanelKind,
    position: Point,
    width: f32,
    height: f32,
    axis: DragAxis,
    /// Interactive control areas, relative to the panel origin
    controls: Vec<Rectangle>,
    drag: Option<PanelDrag>,
}

impl FloatingPanel {
    pub fn new(kind: PanelKind, position: Point, width: f32, height: f32, axis: DragAxis) -> Self {
        Self {
            kind,
            position,
            width,
            height,
            axis,
            controls: Vec::new(),
            drag: None,
        }
    }

    /// Default toolbar: centred along the top edge, one button per action
    pub fn toolbar(viewport: &Rectangle) -> Self {
        let width = 360.0;
        let mut panel = Self::new(
            PanelKind::Toolbar,
            Point::new(viewport.x + (viewport.width - width) / 2.0, viewport.y + 16.0),
            width,
            40.0,
            DragAxis::Horizontal,
        );
        for (i, _) in ToolbarAction::ALL.iter().enumerate() {
            panel.controls.push(toolbar_button_rect(i));
        }
        panel
    }

    /// Default inspector: along the right edge, one input per field
    pub fn inspector(viewport: &Rectangle) -> Self {
        let width = 260.0;
        let mut panel = Self::new(
            PanelKind::Inspector,
            Point::new(viewport.right() - width - 16.0, viewport.y + 72.0),
            width,
            320.0,
            DragAxis::Free,
        );
        for (i, _) in InspectorField::ALL.iter().enumerate() {
            panel.controls.push(inspector_input_rect(i));
        }
        panel
    }

    pub fn with_control(mut self, area: Rectangle) -> Self {
        self.controls.push(area);
        self
    }

    pub fn controls(&self) -> &[Rectangle] {
        &self.controls
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains_point(point)
    }

    /// Index of the control under `point`
    pub fn control_at(&self, point: Point) -> Option<usize> {
        self.controls.iter().position(|area| {
            area.translated(self.position.x, self.position.y)
                .contains_point(point)
        })
    }

    fn on_control(&self, point: Point) -> bool {
        self.control_at(point).is_some()
    }

    /// Start a drag unless the press landed on a control
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if !self.contains(point) || self.on_control(point) {
            return false;
        }
        self.begin_drag(point);
        true
    }

    /// Start a drag regardless of controls (host-detected background press)
    pub fn begin_drag(&mut self, point: Point) {
        self.drag = Some(PanelDrag {
            grab_offset: Point::new(point.x - self.position.x, point.y - self.position.y),
        });
    }

    /// Follow the pointer; returns false when no drag is in progress
    pub fn pointer_move(&mut self, point: Point, viewport: &Rectangle) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let x = point.x - drag.grab_offset.x;
        match self.axis {
            DragAxis::Free => {
                self.position = Point::new(x, point.y - drag.grab_offset.y);
            }
            DragAxis::Horizontal => {
                let max_x = (viewport.right() - self.width).max(viewport.x);
                self.position.x = x.clamp(viewport.x, max_x);
            }
        }
        true
    }

    pub fn pointer_up(&mut self) -> bool {
        self.drag.take().is_some()
    }
}

fn toolbar_button_rect(index: usize) -> Rectangle {
    Rectangle::new(8.0 + index as f32 * 88.0, 6.0, 80.0, 28.0)
}

fn inspector_input_rect(index: usize) -> Rectangle {
    Rectangle::new(100.0, 40.0 + index as f32 * 44.0, 150.0, 28.0)
}

/// Actions offered by the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    SelectMode,
    DesignMode,
    ClearSelection,
    Close,
}

impl ToolbarAction {
    pub const ALL: [ToolbarAction; 4] = [
        ToolbarAction::SelectMode,
        ToolbarAction::DesignMode,
        ToolbarAction::ClearSelection,
        ToolbarAction::Close,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ToolbarAction::SelectMode => "Select",
            ToolbarAction::DesignMode => "Design",
            ToolbarAction::ClearSelection => "Deselect",
            ToolbarAction::Close => "Close",
        }
    }
}

/// Live-editable properties of the selected node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InspectorField {
    Width,
    Height,
    Margin,
    Padding,
    Color,
    BackgroundColor,
}

impl InspectorField {
    pub const ALL: [InspectorField; 6] = [
        InspectorField::Width,
        InspectorField::Height,
        InspectorField::Margin,
        InspectorField::Padding,
        InspectorField::Color,
        InspectorField::BackgroundColor,
    ];

    pub fn property(self) -> &'static str {
        match self {
            InspectorField::Width => "width",
            InspectorField::Height => "height",
            InspectorField::Margin => "margin",
            InspectorField::Padding => "padding",
            InspectorField::Color => "color",
            InspectorField::BackgroundColor => "background-color",
        }
    }

    /// Width and height go through layout and need a re-measure
    pub fn is_geometry(self) -> bool {
        matches!(self, InspectorField::Width | InspectorField::Height)
    }

    fn is_color(self) -> bool {
        matches!(self, InspectorField::Color | InspectorField::BackgroundColor)
    }
}

/// A validated inspector input
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Length(f32),
    Color(String),
}

impl FieldValue {
    /// Value as written into the node's style
    pub fn to_style(&self) -> String {
        match self {
            FieldValue::Length(px) => format!("{}px", px),
            FieldValue::Color(color) => color.clone(),
        }
    }
}

fn length_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*(?:px)?\s*$").unwrap())
}

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})|[a-zA-Z]+)\s*$").unwrap()
    })
}

/// Parse what the operator typed for `field`
pub fn parse_field(field: InspectorField, input: &str) -> Result<FieldValue> {
    if field.is_color() {
        let caps = color_pattern()
            .captures(input)
            .ok_or_else(|| anyhow!("Invalid color for {}: {:?}", field.property(), input))?;
        return Ok(FieldValue::Color(caps[1].to_ascii_lowercase()));
    }

    let caps = length_pattern()
        .captures(input)
        .ok_or_else(|| anyhow!("Invalid length for {}: {:?}", field.property(), input))?;
    let value: f32 = caps[1].parse()?;
    if field.is_geometry() && value < 0.0 {
        return Err(anyhow!("{} cannot be negative", field.property()));
    }
    Ok(FieldValue::Length(value))
}

/// Current value of `field` on `node`, for display
pub fn read_field(doc: &Document, node: NodeId, field: InspectorField) -> String {
    match field {
        InspectorField::Width => doc
            .measure(node)
            .map(|b| format!("{}", b.width))
            .unwrap_or_default(),
        InspectorField::Height => doc
            .measure(node)
            .map(|b| format!("{}", b.height))
            .unwrap_or_default(),
        _ => doc
            .style(node, field.property())
            .unwrap_or_default()
            .to_string(),
    }
}

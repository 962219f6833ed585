use crate::demo::{sample_page, SamplePage};
use crate::highlight::{OverlayFrame, Outline};
use crate::{
    EventJournal, InputEvent, InspectorField, JsonFileStorage, Key, Mode, Overlay, OverlayConfig,
    PanelKind, Point, PointerButton, RecordingOpener, Rectangle, SystemClipboard, ToolbarAction,
};
use anyhow::Result;
use egui::{pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

type HostOverlay = Overlay<SystemClipboard, JsonFileStorage, RecordingOpener>;

const HOVER_COLOR: Color32 = Color32::from_rgb(0, 180, 255);
const SELECT_COLOR: Color32 = Color32::from_rgb(0, 120, 255);
const PREVIEW_COLOR: Color32 = Color32::from_rgb(255, 140, 0);
const DROP_COLOR: Color32 = Color32::from_rgb(40, 180, 90);

/// Demo host: a sample page with the overlay mounted on top
pub struct LiveInspectorApp {
    page: SamplePage,

    overlay: HostOverlay,

    /// Where tree events are exported
    journal: EventJournal,

    /// Inspector text inputs, keyed by field
    inspector_inputs: HashMap<InspectorField, String>,

    /// Selected node the inspector inputs were filled from
    inspector_source: Option<crate::NodeId>,

    /// Status message
    status_message: String,

    /// Canvas origin on screen during the last frame
    canvas_origin: Pos2,
}

impl LiveInspectorApp {
    pub fn new(config: OverlayConfig, storage: JsonFileStorage, journal_path: PathBuf) -> Result<Self> {
        let viewport = Rectangle::new(0.0, 0.0, 1280.0, 760.0);
        let page = sample_page(viewport)?;
        let mut overlay = Overlay::new(config, viewport, SystemClipboard, storage)
            .with_opener(RecordingOpener::new());
        overlay.announce_ready();

        Ok(Self {
            page,
            overlay,
            journal: EventJournal::new(&journal_path),
            inspector_inputs: HashMap::new(),
            inspector_source: None,
            status_message: "Press Select or Design to start inspecting".to_string(),
            canvas_origin: Pos2::ZERO,
        })
    }

    fn render_ui(&mut self, ctx: &egui::Context) {
        let now = Instant::now();

        // Host toolbar
        egui::TopBottomPanel::top("host_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("🔍 Select").clicked() {
                    self.overlay.set_mode(&mut self.page.doc, Mode::Select);
                    self.status_message = "Right-click a node to copy its id".to_string();
                }
                if ui.button("✏ Design").clicked() {
                    self.overlay.set_mode(&mut self.page.doc, Mode::Design);
                    self.status_message =
                        "Click to select, drag handles to resize, hold a child to move it"
                            .to_string();
                }
                if ui.button("📨 Opener request").clicked() {
                    let raw = r#"{"type":"ENABLE_SELECTOR","returnUrl":"/admin/tours/1","stepIndex":0}"#;
                    self.overlay.handle_message(&mut self.page.doc, raw);
                    self.status_message = "Opener enabled the selector".to_string();
                }
                ui.separator();
                if ui.button("🗑 Remove selected").clicked() {
                    self.remove_selected();
                }
                if ui.button("💾 Export events").clicked() {
                    self.export_events();
                }
                if ui.button("↺ Reset page").clicked() {
                    self.reset_page();
                }
            });
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let state = self.overlay.state();
                ui.label(format!("Mode: {:?}", state.mode));
                ui.separator();
                if let Some(hovered) = &state.hovered {
                    ui.label(format!("Hover: {}", hovered.stable_id));
                    ui.separator();
                }
                if let Some(selected) = &state.selected {
                    ui.label(format!("Selected: {}", selected.stable_id));
                    ui.separator();
                }
                ui.label(format!("Revision: {}", self.overlay.store().revision()));
                ui.label(format!("Events: {}", self.page.doc.events().len()));
                ui.separator();
                ui.label(&self.status_message);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_canvas(ui, now);
        });

        if self.overlay.panel_visible(PanelKind::Toolbar) {
            self.render_toolbar_panel(ctx);
        }
        if self.overlay.panel_visible(PanelKind::Inspector) {
            self.render_inspector_panel(ctx);
        } else {
            self.inspector_source = None;
        }

        self.overlay.tick(&mut self.page.doc, now);

        // Timers are host-clocked; keep frames coming while anything is pending
        if self.overlay.mode().is_active() || self.overlay.state().toast.visible {
            ctx.request_repaint();
        }
    }

    fn render_canvas(&mut self, ui: &mut egui::Ui, now: Instant) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let canvas_rect = response.rect;
        self.canvas_origin = canvas_rect.min;
        self.overlay.set_viewport(Rectangle::new(
            0.0,
            0.0,
            canvas_rect.width(),
            canvas_rect.height(),
        ));

        self.forward_input(ui, &response, now);

        self.draw_document(&painter);
        let frame = self.overlay.frame(&self.page.doc);
        self.draw_overlay_frame(&painter, &frame);
        self.draw_toast(&painter, canvas_rect);
    }

    /// Translate egui input into overlay events
    fn forward_input(&mut self, ui: &egui::Ui, response: &egui::Response, now: Instant) {
        let captured = self.overlay.surface().captured();
        let gesture_running = matches!(
            captured,
            Some(crate::surface::DragCapture::Resize) | Some(crate::surface::DragCapture::Transfer)
        );
        let (latest, moved, pressed, released, escape) = ui.input(|i| {
            (
                i.pointer.latest_pos(),
                i.pointer.delta() != egui::Vec2::ZERO,
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.key_pressed(egui::Key::Escape),
            )
        });
        let Some(latest) = latest.map(|p| self.screen_to_doc(p)) else {
            return;
        };

        let doc = &mut self.page.doc;
        if moved && (response.hovered() || gesture_running) {
            self.overlay
                .handle_event(doc, InputEvent::PointerMove(latest), now);
        }
        if pressed && response.hovered() {
            self.overlay.handle_event(
                doc,
                InputEvent::PointerDown {
                    position: latest,
                    button: PointerButton::Primary,
                },
                now,
            );
        }
        if released && gesture_running {
            self.overlay
                .handle_event(doc, InputEvent::PointerUp(latest), now);
        }
        if response.clicked() {
            self.overlay.handle_event(doc, InputEvent::Click(latest), now);
        }
        if response.secondary_clicked() {
            self.overlay
                .handle_event(doc, InputEvent::ContextMenu(latest), now);
            if self.overlay.mode() == Mode::Select {
                if let Some(report) = self.overlay.last_report() {
                    self.status_message = format!("Copied {}", report.selector);
                }
            }
        }
        if escape
            && self
                .overlay
                .handle_event(doc, InputEvent::KeyDown(Key::Escape), now)
        {
            self.status_message = "Inspector closed".to_string();
        }
    }

    fn draw_document(&self, painter: &egui::Painter) {
        let doc = &self.page.doc;
        for (depth, id) in doc.attached_nodes().into_iter().enumerate() {
            let Some(node) = doc.get(id) else {
                continue;
            };
            let rect = self.doc_to_screen_rect(&node.bounds);
            let fill = node
                .style
                .get("background-color")
                .and_then(|c| Color32::from_hex(c).ok())
                .unwrap_or_else(|| Color32::from_gray(250 - (depth % 6) as u8 * 6));
            let stroke = if node.has_class(&self.overlay.config().hover_class) {
                Stroke::new(1.5, HOVER_COLOR)
            } else {
                Stroke::new(1.0, Color32::from_gray(200))
            };
            painter.rect(rect, 4.0, fill, stroke);

            if !node.text.is_empty() {
                let color = node
                    .style
                    .get("color")
                    .and_then(|c| Color32::from_hex(c).ok())
                    .unwrap_or(Color32::DARK_GRAY);
                painter.text(
                    rect.left_top() + vec2(6.0, 6.0),
                    Align2::LEFT_TOP,
                    &node.text,
                    FontId::proportional(14.0),
                    color,
                );
            }
        }
    }

    fn draw_outline(&self, painter: &egui::Painter, outline: &Outline, color: Color32) {
        let rect = self.doc_to_screen_rect(&outline.bounds);
        painter.rect_stroke(rect, 2.0, Stroke::new(2.0, color));
        painter.text(
            rect.left_top() + vec2(0.0, -2.0),
            Align2::LEFT_BOTTOM,
            &outline.label,
            FontId::monospace(11.0),
            color,
        );
    }

    fn draw_overlay_frame(&self, painter: &egui::Painter, frame: &OverlayFrame) {
        if let Some(hover) = &frame.hover {
            self.draw_outline(painter, hover, HOVER_COLOR);
        }
        if let Some(selection) = &frame.selection {
            self.draw_outline(painter, selection, SELECT_COLOR);
        }
        if let Some(preview) = &frame.resize_preview {
            let rect = self.doc_to_screen_rect(preview);
            painter.rect(
                rect,
                2.0,
                PREVIEW_COLOR.gamma_multiply(0.15),
                Stroke::new(1.5, PREVIEW_COLOR),
            );
        }
        for (_, handle) in &frame.handles {
            let rect = self.doc_to_screen_rect(handle);
            painter.rect(rect, 2.0, SELECT_COLOR, Stroke::new(1.0, Color32::WHITE));
        }

        if let Some(scan) = &frame.scan {
            let rect = self.doc_to_screen_rect(&scan.bounds);
            painter.rect_filled(rect, 2.0, SELECT_COLOR.gamma_multiply(0.2));
            let bar = Rect::from_min_size(
                pos2(rect.left(), rect.bottom() - 4.0),
                vec2(rect.width() * scan.progress / 100.0, 4.0),
            );
            painter.rect_filled(bar, 0.0, SELECT_COLOR);
        }

        if let Some(drag) = &frame.drag_preview {
            if let Some(target) = &drag.drop_target {
                self.draw_outline(painter, target, DROP_COLOR);
            }
            let rect = self.doc_to_screen_rect(&drag.bounds);
            let corners = [
                rect.left_top(),
                rect.right_top(),
                rect.right_bottom(),
                rect.left_bottom(),
                rect.left_top(),
            ];
            painter.extend(Shape::dashed_line(
                &corners,
                Stroke::new(1.5, SELECT_COLOR),
                6.0,
                4.0,
            ));
        }
    }

    fn draw_toast(&self, painter: &egui::Painter, canvas_rect: Rect) {
        let toast = &self.overlay.state().toast;
        if !toast.visible {
            return;
        }
        let rect = Rect::from_min_size(
            canvas_rect.right_bottom() - vec2(340.0, 76.0),
            vec2(320.0, 56.0),
        );
        painter.rect(
            rect,
            6.0,
            Color32::from_rgb(32, 32, 40),
            Stroke::new(1.0, Color32::from_gray(90)),
        );
        painter.text(
            rect.left_top() + vec2(12.0, 10.0),
            Align2::LEFT_TOP,
            &toast.message,
            FontId::proportional(14.0),
            Color32::WHITE,
        );
        painter.text(
            rect.left_top() + vec2(12.0, 32.0),
            Align2::LEFT_TOP,
            &toast.detail,
            FontId::monospace(11.0),
            Color32::from_gray(180),
        );
    }

    /// Floating action bar; dragging its background moves it sideways
    fn render_toolbar_panel(&mut self, ctx: &egui::Context) {
        let bounds = self.overlay.panel(PanelKind::Toolbar).bounds();
        let pos = self.doc_to_screen(Point::new(bounds.x, bounds.y));

        let mut clicked = None;
        egui::Area::new(egui::Id::new("inspector_toolbar"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let rect = Rect::from_min_size(pos, vec2(bounds.width, bounds.height));
                let background = ui.interact(rect, ui.id().with("background"), Sense::drag());
                ui.painter().rect(
                    rect,
                    6.0,
                    Color32::from_rgb(32, 32, 40),
                    Stroke::new(1.0, Color32::from_gray(90)),
                );
                self.follow_panel_drag(PanelKind::Toolbar, &background);

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.add_space(8.0);
                    for action in ToolbarAction::ALL {
                        let selected = matches!(
                            (action, self.overlay.mode()),
                            (ToolbarAction::SelectMode, Mode::Select)
                                | (ToolbarAction::DesignMode, Mode::Design)
                        );
                        let button = egui::Button::new(action.label())
                            .selected(selected)
                            .min_size(vec2(80.0, 28.0));
                        if ui.add(button).clicked() {
                            clicked = Some(action);
                        }
                    }
                });
            });

        if let Some(action) = clicked {
            self.overlay
                .apply_toolbar_action(&mut self.page.doc, action);
            self.status_message = format!("{} pressed", action.label());
        }
    }

    /// Property inspector for the selected node
    fn render_inspector_panel(&mut self, ctx: &egui::Context) {
        let selected = self.overlay.state().selected.as_ref().map(|t| t.node);
        if selected != self.inspector_source {
            self.inspector_inputs.clear();
            if let Some(node) = selected {
                for field in InspectorField::ALL {
                    self.inspector_inputs.insert(
                        field,
                        crate::panels::read_field(&self.page.doc, node, field),
                    );
                }
            }
            self.inspector_source = selected;
        }

        let bounds = self.overlay.panel(PanelKind::Inspector).bounds();
        let pos = self.doc_to_screen(Point::new(bounds.x, bounds.y));
        let title = self
            .overlay
            .state()
            .selected
            .as_ref()
            .map(|t| t.stable_id.clone())
            .unwrap_or_default();

        let mut submitted = Vec::new();
        egui::Area::new(egui::Id::new("inspector_panel"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let rect = Rect::from_min_size(pos, vec2(bounds.width, bounds.height));
                let background = ui.interact(rect, ui.id().with("background"), Sense::drag());
                ui.painter().rect(
                    rect,
                    6.0,
                    Color32::from_rgb(32, 32, 40),
                    Stroke::new(1.0, Color32::from_gray(90)),
                );
                self.follow_panel_drag(PanelKind::Inspector, &background);

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.add_space(10.0);
                    ui.colored_label(Color32::WHITE, &title);
                });
                for field in InspectorField::ALL {
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        ui.add_space(10.0);
                        ui.add_sized(
                            vec2(80.0, 24.0),
                            egui::Label::new(
                                egui::RichText::new(field.property()).color(Color32::LIGHT_GRAY),
                            ),
                        );
                        let input = self.inspector_inputs.entry(field).or_default();
                        let edit = ui.add_sized(vec2(150.0, 24.0), egui::TextEdit::singleline(input));
                        if edit.lost_focus() {
                            submitted.push((field, input.clone()));
                        }
                    });
                }
            });

        for (field, value) in submitted {
            match self
                .overlay
                .apply_inspector_field(&mut self.page.doc, field, &value)
            {
                Ok(()) => {
                    self.status_message = format!("Set {} to {}", field.property(), value);
                    if field.is_geometry() {
                        // Layout may have clamped the value
                        self.inspector_source = None;
                    }
                }
                Err(e) => self.status_message = format!("Error: {}", e),
            }
        }
    }

    fn follow_panel_drag(&mut self, kind: PanelKind, background: &egui::Response) {
        let Some(pointer) = background.interact_pointer_pos() else {
            return;
        };
        let point = self.screen_to_doc(pointer);
        if background.drag_started() {
            self.overlay.begin_panel_drag(kind, point);
        } else if background.dragged() {
            self.overlay.drag_panel(point);
        }
        if background.drag_stopped() {
            self.overlay.end_panel_drag();
        }
    }

    fn remove_selected(&mut self) {
        let Some(node) = self.overlay.state().selected.as_ref().map(|t| t.node) else {
            self.status_message = "Nothing selected".to_string();
            return;
        };
        match self.page.doc.remove(node) {
            Ok(()) => self.status_message = "Selected node removed from the page".to_string(),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    fn export_events(&mut self) {
        match self.journal.append(self.page.doc.events()) {
            Ok(()) => {
                self.status_message = format!(
                    "Exported {} events to {}",
                    self.page.doc.events().len(),
                    self.journal.path().display()
                );
                self.page.doc.clear_events();
            }
            Err(e) => {
                tracing::error!(error = %e, "event export failed");
                self.status_message = format!("Error: {}", e);
            }
        }
    }

    fn reset_page(&mut self) {
        self.overlay.unmount(&mut self.page.doc);
        match sample_page(self.overlay.viewport()) {
            Ok(page) => {
                self.page = page;
                self.status_message = "Page reset".to_string();
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    // --- coordinates ---

    fn doc_to_screen(&self, point: Point) -> Pos2 {
        self.canvas_origin + vec2(point.x, point.y)
    }

    fn screen_to_doc(&self, pos: Pos2) -> Point {
        Point::new(pos.x - self.canvas_origin.x, pos.y - self.canvas_origin.y)
    }

    fn doc_to_screen_rect(&self, rect: &Rectangle) -> Rect {
        Rect::from_min_size(
            self.doc_to_screen(Point::new(rect.x, rect.y)),
            vec2(rect.width, rect.height),
        )
    }
}

impl eframe::App for LiveInspectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render_ui(ctx);
    }
}

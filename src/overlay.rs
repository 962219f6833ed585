//! The overlay controller.
//!
//! Routes host input through the event surface into the gesture machines,
//! keeps the store and the live tree in step, and composes one
//! [`OverlayFrame`] per host frame. Handlers never return errors to the
//! host: failures are logged and the current action is dropped.

use crate::clipboard::ClipboardSink;
use crate::handshake::{
    ActivationRequest, OpenerChannel, OpenerMessage, OutboundMessage, SelectionReport,
    StoredSelection,
};
use crate::highlight::{HighlightRenderer, OverlayFrame};
use crate::hover::HoverDebouncer;
use crate::panels::{parse_field, FloatingPanel, InspectorField, PanelKind, ToolbarAction};
use crate::resize::{handle_at, ResizeSession};
use crate::resolver::structural_selector;
use crate::storage::{store_selection, SelectionStorage};
use crate::store::{Action, EditorState, EditorStore, Mode};
use crate::surface::{DragCapture, EventSurface, InputEvent, Key, PointerButton};
use crate::toast::ToastNotifier;
use crate::transfer::{TransferEvent, TransferGesture};
use crate::{Document, NodeId, NodeResolver, OverlayConfig, Point, Rectangle, Target};
use anyhow::{anyhow, Result};
use std::time::Instant;

pub struct Overlay<C, S, O> {
    config: OverlayConfig,
    resolver: NodeResolver,
    renderer: HighlightRenderer,
    store: EditorStore,
    surface: EventSurface,
    hover: HoverDebouncer,
    transfer: TransferGesture,
    resize: Option<ResizeSession>,
    toast: ToastNotifier,
    toolbar: FloatingPanel,
    inspector: FloatingPanel,
    viewport: Rectangle,
    request: Option<ActivationRequest>,
    last_report: Option<SelectionReport>,
    clipboard: C,
    storage: S,
    opener: Option<O>,
    /// Node currently carrying the hover class
    hover_marked: Option<NodeId>,
    /// Node currently carrying the selected marker
    selection_marked: Option<NodeId>,
    /// Swallow the click generated by the release of a drag
    suppress_click: bool,
}

impl<C, S, O> Overlay<C, S, O>
where
    C: ClipboardSink,
    S: SelectionStorage,
    O: OpenerChannel,
{
    pub fn new(config: OverlayConfig, viewport: Rectangle, clipboard: C, storage: S) -> Self {
        Self {
            resolver: NodeResolver::new(&config),
            renderer: HighlightRenderer::new(config.handle_size),
            store: EditorStore::new(),
            surface: EventSurface::new(),
            hover: HoverDebouncer::new(config.hover_debounce()),
            transfer: TransferGesture::new(&config),
            resize: None,
            toast: ToastNotifier::new(config.toast_duration()),
            toolbar: FloatingPanel::toolbar(&viewport),
            inspector: FloatingPanel::inspector(&viewport),
            viewport,
            request: None,
            last_report: None,
            clipboard,
            storage,
            opener: None,
            hover_marked: None,
            selection_marked: None,
            suppress_click: false,
            config,
        }
    }

    /// Attach the window that will receive selection reports
    pub fn with_opener(mut self, opener: O) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn resolver(&self) -> &NodeResolver {
        &self.resolver
    }

    pub fn state(&self) -> &EditorState {
        self.store.state()
    }

    pub fn store(&self) -> &EditorStore {
        &self.store
    }

    pub fn mode(&self) -> Mode {
        self.store.state().mode
    }

    pub fn surface(&self) -> &EventSurface {
        &self.surface
    }

    pub fn transfer(&self) -> &TransferGesture {
        &self.transfer
    }

    pub fn resize_session(&self) -> Option<&ResizeSession> {
        self.resize.as_ref()
    }

    pub fn request(&self) -> Option<&ActivationRequest> {
        self.request.as_ref()
    }

    pub fn last_report(&self) -> Option<&SelectionReport> {
        self.last_report.as_ref()
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn opener(&self) -> Option<&O> {
        self.opener.as_ref()
    }

    pub fn viewport(&self) -> Rectangle {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rectangle) {
        self.viewport = viewport;
    }

    pub fn panel(&self, kind: PanelKind) -> &FloatingPanel {
        match kind {
            PanelKind::Toolbar => &self.toolbar,
            PanelKind::Inspector => &self.inspector,
        }
    }

    fn panel_mut(&mut self, kind: PanelKind) -> &mut FloatingPanel {
        match kind {
            PanelKind::Toolbar => &mut self.toolbar,
            PanelKind::Inspector => &mut self.inspector,
        }
    }

    /// The toolbar shows while active; the inspector only with a Design selection
    pub fn panel_visible(&self, kind: PanelKind) -> bool {
        let state = self.store.state();
        match kind {
            PanelKind::Toolbar => state.mode.is_active(),
            PanelKind::Inspector => state.mode == Mode::Design && state.selected.is_some(),
        }
    }

    fn panel_at(&self, point: Point) -> Option<PanelKind> {
        [PanelKind::Inspector, PanelKind::Toolbar]
            .into_iter()
            .find(|kind| self.panel_visible(*kind) && self.panel(*kind).contains(point))
    }

    // --- activation ---

    /// Tell the opener the overlay is listening
    pub fn announce_ready(&mut self) {
        if let Some(opener) = self.opener.as_mut() {
            if let Err(e) = opener.post(&OutboundMessage::SelectorReady) {
                tracing::warn!(error = %e, "failed to announce readiness");
            }
        }
    }

    /// Enter Select mode for a pick requested by the opener
    pub fn activate(&mut self, doc: &mut Document, request: ActivationRequest) {
        tracing::info!(
            return_url = ?request.return_url,
            step_index = ?request.step_index,
            "selector enabled"
        );
        self.set_mode(doc, Mode::Select);
        self.request = Some(request);
    }

    /// Activate from the page URL's query parameters; returns whether it did
    pub fn activate_from_url(&mut self, doc: &mut Document, page_url: &str) -> bool {
        match ActivationRequest::from_url(page_url) {
            Ok(Some(request)) => {
                self.activate(doc, request);
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring page URL");
                false
            }
        }
    }

    /// Handle a raw message from the opener; unknown messages are ignored
    pub fn handle_message(&mut self, doc: &mut Document, raw: &str) -> bool {
        match OpenerMessage::from_json(raw) {
            Ok(message) => {
                self.activate(doc, message.into());
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "ignoring opener message");
                false
            }
        }
    }

    // --- mode ---

    /// Switch mode, abandoning any gesture in flight
    pub fn set_mode(&mut self, doc: &mut Document, mode: Mode) {
        if self.mode() == mode {
            return;
        }
        self.abandon_gestures();
        self.unmark_hover(doc);
        self.unmark_selection(doc);
        self.hover.reset();
        if !mode.is_active() {
            self.request = None;
        }
        self.store.dispatch(Action::SetMode(mode));
        self.surface.sync(mode);
    }

    /// Escape, Close or an external request: back to Inactive
    pub fn deactivate(&mut self, doc: &mut Document) {
        self.set_mode(doc, Mode::Inactive);
    }

    /// Release everything, including the toast timer
    pub fn unmount(&mut self, doc: &mut Document) {
        self.deactivate(doc);
        self.toast.cancel();
        self.store.dispatch(Action::HideToast);
        self.surface.unbind();
    }

    fn abandon_gestures(&mut self) {
        if self.transfer.cancel() {
            tracing::debug!("transfer abandoned");
        }
        if self.resize.take().is_some() {
            tracing::debug!("resize abandoned");
        }
        for kind in [PanelKind::Toolbar, PanelKind::Inspector] {
            self.panel_mut(kind).pointer_up();
        }
        self.surface.release();
        self.suppress_click = false;
    }

    pub fn apply_toolbar_action(&mut self, doc: &mut Document, action: ToolbarAction) {
        match action {
            ToolbarAction::SelectMode => self.set_mode(doc, Mode::Select),
            ToolbarAction::DesignMode => self.set_mode(doc, Mode::Design),
            ToolbarAction::ClearSelection => self.clear_selection(doc),
            ToolbarAction::Close => self.deactivate(doc),
        }
    }

    // --- selection ---

    fn select(&mut self, doc: &mut Document, target: Target) {
        self.unmark_hover(doc);
        self.hover.reset();
        self.unmark_selection(doc);

        if doc.attribute(target.node, &self.config.selected_marker).is_none() {
            match doc.set_attribute(target.node, &self.config.selected_marker, "true") {
                Ok(()) => self.selection_marked = Some(target.node),
                Err(e) => tracing::warn!(error = %e, "failed to mark selection"),
            }
        }
        tracing::debug!(stable_id = %target.stable_id, "node selected");
        self.store.dispatch(Action::Select(target));
    }

    pub fn clear_selection(&mut self, doc: &mut Document) {
        self.abandon_gestures();
        self.unmark_selection(doc);
        self.store.dispatch(Action::ClearSelection);
    }

    fn unmark_selection(&mut self, doc: &mut Document) {
        if let Some(node) = self.selection_marked.take() {
            if let Err(e) = doc.remove_attribute(node, &self.config.selected_marker) {
                tracing::debug!(error = %e, "selected marker already gone");
            }
        }
    }

    fn unmark_hover(&mut self, doc: &mut Document) {
        if let Some(node) = self.hover_marked.take() {
            if let Err(e) = doc.remove_class(node, &self.config.hover_class) {
                tracing::debug!(error = %e, "hover class already gone");
            }
        }
    }

    /// Re-measure the selected node and store the fresh box
    fn refresh_selection(&mut self, doc: &Document) {
        let bounds = self
            .store
            .state()
            .selected
            .as_ref()
            .and_then(|t| t.remeasure(doc));
        if let Some(bounds) = bounds {
            self.store.dispatch(Action::RefreshSelection(bounds));
        }
    }

    /// Write an inspector field to the selected node
    pub fn apply_inspector_field(
        &mut self,
        doc: &mut Document,
        field: InspectorField,
        input: &str,
    ) -> Result<()> {
        let node = self
            .store
            .state()
            .selected
            .as_ref()
            .map(|t| t.node)
            .ok_or_else(|| anyhow!("No node selected"))?;
        let current = doc
            .measure(node)
            .ok_or_else(|| anyhow!("Selected node is no longer in the tree"))?;
        let value = parse_field(field, input)?;

        match (field, &value) {
            (InspectorField::Width, crate::panels::FieldValue::Length(width)) => {
                doc.set_size(node, *width, current.height)?;
                self.refresh_selection(doc);
            }
            (InspectorField::Height, crate::panels::FieldValue::Length(height)) => {
                doc.set_size(node, current.width, *height)?;
                self.refresh_selection(doc);
            }
            _ => doc.set_style(node, field.property(), value.to_style())?,
        }
        tracing::debug!(%node, property = field.property(), value = %value.to_style(), "style edited");
        Ok(())
    }

    // --- panels ---

    /// Start moving a panel from a host-detected background press
    pub fn begin_panel_drag(&mut self, kind: PanelKind, point: Point) {
        if !self.panel_visible(kind) {
            return;
        }
        self.panel_mut(kind).begin_drag(point);
        self.surface.capture(DragCapture::Panel(kind));
    }

    pub fn drag_panel(&mut self, point: Point) -> bool {
        let Some(DragCapture::Panel(kind)) = self.surface.captured() else {
            return false;
        };
        let viewport = self.viewport;
        self.panel_mut(kind).pointer_move(point, &viewport)
    }

    pub fn end_panel_drag(&mut self) {
        if let Some(DragCapture::Panel(kind)) = self.surface.captured() {
            self.surface.release();
            self.panel_mut(kind).pointer_up();
        }
    }

    // --- input ---

    /// Route one input event; returns whether the overlay consumed it
    pub fn handle_event(&mut self, doc: &mut Document, event: InputEvent, now: Instant) -> bool {
        if !self.surface.accepts(&event) {
            return false;
        }
        match event {
            InputEvent::PointerMove(point) => self.pointer_move(doc, point, now),
            InputEvent::PointerDown { position, button } => {
                self.pointer_down(doc, position, button, now)
            }
            InputEvent::PointerUp(point) => self.pointer_up(doc, point, now),
            InputEvent::Click(point) => self.click(doc, point),
            InputEvent::ContextMenu(point) => self.context_menu(doc, point, now),
            InputEvent::KeyDown(Key::Escape) => {
                self.deactivate(doc);
                true
            }
            InputEvent::KeyDown(_) => false,
        }
    }

    fn pointer_move(&mut self, doc: &Document, point: Point, now: Instant) -> bool {
        match self.surface.captured() {
            Some(DragCapture::Resize) => {
                if let Some(session) = self.resize.as_mut() {
                    session.drag(point);
                    self.suppress_click = true;
                }
                true
            }
            Some(DragCapture::Panel(kind)) => {
                let viewport = self.viewport;
                self.panel_mut(kind).pointer_move(point, &viewport);
                self.suppress_click = true;
                true
            }
            Some(DragCapture::Transfer) => {
                if self.transfer.pointer().is_some() {
                    self.transfer.pointer_moved(point);
                }
                true
            }
            None => {
                if self.store.state().locked {
                    return false;
                }
                let candidate = if self.panel_at(point).is_some() {
                    None
                } else {
                    self.resolver.resolve_at(doc, point)
                };
                self.hover.observe(candidate, now);
                false
            }
        }
    }

    fn pointer_down(
        &mut self,
        doc: &Document,
        point: Point,
        button: PointerButton,
        now: Instant,
    ) -> bool {
        self.suppress_click = false;
        if button != PointerButton::Primary {
            return false;
        }

        if let Some(kind) = self.panel_at(point) {
            if self.panel_mut(kind).pointer_down(point) {
                self.surface.capture(DragCapture::Panel(kind));
            }
            return true;
        }

        let state = self.store.state();
        if state.mode != Mode::Design {
            return false;
        }
        let Some(selected) = state.selected.clone() else {
            return false;
        };
        let Some(bounds) = selected.remeasure(doc) else {
            return false;
        };

        if let Some(handle) = handle_at(&bounds, point, self.config.handle_size) {
            if let Some(session) =
                ResizeSession::begin(doc, selected.node, handle, point, self.config.min_size)
            {
                self.resize = Some(session);
                self.surface.capture(DragCapture::Resize);
                return true;
            }
        }

        let child = doc.nodes_at_point(point).into_iter().find(|id| {
            doc.get(*id).is_some_and(|n| !n.overlay) && doc.is_descendant_of(*id, selected.node)
        });
        let Some(child) = child else {
            return false;
        };

        if self.transfer.begin(doc, selected.node, child, now) {
            let child_id = self.resolver.identify(doc, child).unwrap_or_default();
            self.store.dispatch(Action::BeginScan {
                child,
                child_id,
                at: now,
            });
            self.surface.capture(DragCapture::Transfer);
            return true;
        }
        false
    }

    fn pointer_up(&mut self, doc: &mut Document, point: Point, now: Instant) -> bool {
        match self.surface.release() {
            Some(DragCapture::Resize) => {
                if let Some(session) = self.resize.take() {
                    match session.commit(doc, point) {
                        Ok(bounds) => {
                            self.store.dispatch(Action::RefreshSelection(bounds));
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "resize dropped");
                            self.clear_selection(doc);
                        }
                    }
                }
                true
            }
            Some(DragCapture::Panel(kind)) => {
                self.panel_mut(kind).pointer_up();
                true
            }
            Some(DragCapture::Transfer) => {
                let armed = self.transfer.pointer().is_some();
                if let Some(event) = self.transfer.release(doc, &self.resolver, point) {
                    self.finish_transfer(doc, event, now);
                }
                self.suppress_click = armed;
                true
            }
            None => false,
        }
    }

    fn finish_transfer(&mut self, doc: &mut Document, event: TransferEvent, now: Instant) {
        match event {
            TransferEvent::Committed(commit) => {
                self.store.dispatch(Action::EndTransfer);
                self.refresh_selection(doc);
                self.toast.show(
                    &mut self.store,
                    format!("Moved into {}", commit.target_id),
                    format!("{} is now {}", commit.old_id, commit.new_id),
                    now,
                );
            }
            TransferEvent::Cancelled(reason) => {
                tracing::debug!(?reason, "transfer cancelled");
                self.store.dispatch(Action::EndTransfer);
            }
            TransferEvent::Progress(_) | TransferEvent::Armed => {}
        }
    }

    fn click(&mut self, doc: &mut Document, point: Point) -> bool {
        if std::mem::take(&mut self.suppress_click) {
            return true;
        }

        if let Some(kind) = self.panel_at(point) {
            if kind == PanelKind::Toolbar {
                if let Some(action) = self
                    .toolbar
                    .control_at(point)
                    .and_then(|i| ToolbarAction::ALL.get(i).copied())
                {
                    self.apply_toolbar_action(doc, action);
                }
            }
            return true;
        }

        if self.mode() != Mode::Design {
            // Swallowed so the host page does not navigate mid-pick
            return true;
        }
        if let Some(target) = self.resolver.resolve_at(doc, point) {
            self.select(doc, target);
        }
        true
    }

    fn context_menu(&mut self, doc: &mut Document, point: Point, now: Instant) -> bool {
        match self.mode() {
            Mode::Select => {
                let target = self
                    .resolver
                    .resolve_at(doc, point)
                    .or_else(|| self.store.state().hovered.clone());
                if let Some(target) = target {
                    self.pick(doc, target, now);
                }
                true
            }
            Mode::Design => {
                self.clear_selection(doc);
                true
            }
            Mode::Inactive => false,
        }
    }

    /// Confirm a Select-mode pick: clipboard, toast, opener and storage
    fn pick(&mut self, doc: &Document, target: Target, now: Instant) {
        if let Err(e) = self.clipboard.copy_text(&target.stable_id) {
            tracing::warn!(error = %e, "clipboard write failed");
        }
        self.toast
            .show(&mut self.store, "Copied to clipboard", target.stable_id.clone(), now);

        let Some(element_info) = self.resolver.element_info(doc, target.node) else {
            return;
        };
        let request = self.request.clone().unwrap_or_default();
        let report = SelectionReport {
            selector: structural_selector(doc, target.node)
                .unwrap_or_else(|| target.stable_id.clone()),
            stable_id: self.resolver.annotation(doc, target.node),
            step_index: request.step_index,
            element_info,
        };
        tracing::info!(selector = %report.selector, stable_id = ?report.stable_id, "element picked");

        if let Some(opener) = self.opener.as_mut() {
            let message = OutboundMessage::ElementSelected(report.clone());
            if let Err(e) = opener.post(&message) {
                tracing::warn!(error = %e, "failed to notify opener");
            }
        }

        let stored = StoredSelection::from_report(&report, &request);
        if let Err(e) = store_selection(&mut self.storage, &self.config.storage_key, &stored) {
            tracing::warn!(error = %e, "failed to persist selection");
        }
        self.last_report = Some(report);
    }

    // --- time ---

    /// Advance timers and drop references to nodes that left the tree
    pub fn tick(&mut self, doc: &mut Document, now: Instant) {
        self.toast.tick(&mut self.store, now);
        if !self.mode().is_active() {
            return;
        }

        self.drop_stale(doc);

        if let Some(commit) = self.hover.poll(now) {
            if !self.store.state().locked {
                self.unmark_hover(doc);
                if let Some(current) = &commit.current {
                    match doc.add_class(current.node, &self.config.hover_class) {
                        Ok(_) => self.hover_marked = Some(current.node),
                        Err(e) => tracing::debug!(error = %e, "hover target vanished"),
                    }
                }
                self.store.dispatch(Action::Hover(commit.current));
            }
        }

        match self.transfer.tick(doc, now) {
            Some(TransferEvent::Progress(progress)) => {
                self.store.dispatch(Action::ScanProgress(progress));
            }
            Some(TransferEvent::Armed) => {
                self.store.dispatch(Action::ScanProgress(100.0));
                self.store.dispatch(Action::ArmTransfer);
            }
            Some(TransferEvent::Cancelled(reason)) => {
                tracing::debug!(?reason, "transfer cancelled");
                self.store.dispatch(Action::EndTransfer);
                if self.surface.captured() == Some(DragCapture::Transfer) {
                    self.surface.release();
                }
            }
            Some(TransferEvent::Committed(_)) | None => {}
        }
    }

    fn drop_stale(&mut self, doc: &mut Document) {
        let state = self.store.state();
        let selected_gone = state
            .selected
            .as_ref()
            .is_some_and(|t| !doc.is_attached(t.node));
        let hovered_gone = state
            .hovered
            .as_ref()
            .is_some_and(|t| !doc.is_attached(t.node));

        if selected_gone {
            tracing::debug!("selected node left the tree");
            self.clear_selection(doc);
        }
        if hovered_gone {
            self.unmark_hover(doc);
            self.hover.reset();
            self.store.dispatch(Action::Hover(None));
        }
        if let Some(child) = self.transfer.child() {
            if !doc.is_attached(child) && self.transfer.pointer().is_some() {
                self.transfer.cancel();
                self.store.dispatch(Action::EndTransfer);
                self.surface.release();
            }
        }
    }

    // --- painting ---

    pub fn frame(&self, doc: &Document) -> OverlayFrame {
        self.renderer.compose(
            doc,
            self.store.state(),
            &self.resolver,
            self.resize.as_ref(),
            &self.transfer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::handshake::RecordingOpener;
    use crate::storage::{load_selection, MemoryStorage};
    use crate::{EventType, Node};
    use std::time::Duration;

    type TestOverlay = Overlay<MemoryClipboard, MemoryStorage, RecordingOpener>;

    struct Page {
        doc: Document,
        card: NodeId,
        title: NodeId,
        sidebar: NodeId,
    }

    fn page() -> Page {
        let mut doc = Document::new(Rectangle::new(0.0, 0.0, 1200.0, 800.0));
        let root = doc.root();
        let main = doc
            .insert(root, Node::new("main", Rectangle::new(0.0, 100.0, 800.0, 700.0)))
            .unwrap();
        let card = doc
            .insert(
                main,
                Node::new("section", Rectangle::new(100.0, 200.0, 300.0, 300.0))
                    .with_attribute("data-registry-id", "pricing-card")
                    .with_text("Pro plan"),
            )
            .unwrap();
        let title = doc
            .insert(
                card,
                Node::new("h2", Rectangle::new(110.0, 210.0, 200.0, 40.0)).with_text("Pro"),
            )
            .unwrap();
        let sidebar = doc
            .insert(
                main,
                Node::new("aside", Rectangle::new(500.0, 200.0, 250.0, 400.0))
                    .with_dom_id("sidebar"),
            )
            .unwrap();
        doc.clear_events();
        Page {
            doc,
            card,
            title,
            sidebar,
        }
    }

    fn overlay() -> TestOverlay {
        Overlay::new(
            OverlayConfig::default(),
            Rectangle::new(0.0, 0.0, 1200.0, 800.0),
            MemoryClipboard::new(),
            MemoryStorage::new(),
        )
        .with_opener(RecordingOpener::new())
    }

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    fn select_card(overlay: &mut TestOverlay, page: &mut Page, now: Instant) {
        overlay.set_mode(&mut page.doc, Mode::Design);
        assert!(overlay.handle_event(&mut page.doc, InputEvent::Click(Point::new(350.0, 450.0)), now));
        assert_eq!(overlay.state().selected.as_ref().unwrap().node, page.card);
    }

    fn press(position: Point) -> InputEvent {
        InputEvent::PointerDown {
            position,
            button: PointerButton::Primary,
        }
    }

    #[test]
    fn test_events_ignored_while_inactive() {
        let mut page = page();
        let mut overlay = overlay();
        let now = Instant::now();

        assert!(!overlay.handle_event(&mut page.doc, InputEvent::Click(Point::new(350.0, 450.0)), now));
        assert!(!overlay.surface().is_bound());
        assert_eq!(overlay.state().selected, None);
    }

    #[test]
    fn test_hover_commits_once_per_identity() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        overlay.set_mode(&mut page.doc, Mode::Design);

        // Many moves inside the same registered region
        for (i, x) in [120.0, 150.0, 200.0, 250.0].into_iter().enumerate() {
            let now = ms(start, i as u64 * 10);
            overlay.handle_event(&mut page.doc, InputEvent::PointerMove(Point::new(x, 220.0)), now);
            overlay.tick(&mut page.doc, now);
        }
        overlay.tick(&mut page.doc, ms(start, 200));
        overlay.tick(&mut page.doc, ms(start, 400));

        let toggles = page
            .doc
            .events()
            .iter()
            .filter(|e| matches!(&e.event, EventType::ClassChanged { class, .. } if class == "inspector-hover"))
            .count();
        assert_eq!(toggles, 1);
        assert!(page.doc.has_class(page.card, "inspector-hover"));
        assert_eq!(
            overlay.state().hovered.as_ref().unwrap().stable_id,
            "pricing-card"
        );
    }

    #[test]
    fn test_transient_miss_does_not_flicker() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        overlay.set_mode(&mut page.doc, Mode::Design);

        overlay.handle_event(&mut page.doc, InputEvent::PointerMove(Point::new(550.0, 300.0)), start);
        overlay.tick(&mut page.doc, ms(start, 60));
        assert!(page.doc.has_class(page.sidebar, "inspector-hover"));

        // Cross into the card for 20ms, then back
        overlay.handle_event(&mut page.doc, InputEvent::PointerMove(Point::new(350.0, 300.0)), ms(start, 70));
        overlay.tick(&mut page.doc, ms(start, 80));
        overlay.handle_event(&mut page.doc, InputEvent::PointerMove(Point::new(550.0, 300.0)), ms(start, 90));
        overlay.tick(&mut page.doc, ms(start, 200));

        assert!(page.doc.has_class(page.sidebar, "inspector-hover"));
        assert!(!page.doc.has_class(page.card, "inspector-hover"));
    }

    #[test]
    fn test_click_selects_locks_and_marks() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        overlay.set_mode(&mut page.doc, Mode::Design);

        overlay.handle_event(&mut page.doc, InputEvent::PointerMove(Point::new(350.0, 450.0)), start);
        overlay.tick(&mut page.doc, ms(start, 60));
        assert!(page.doc.has_class(page.card, "inspector-hover"));

        overlay.handle_event(&mut page.doc, InputEvent::Click(Point::new(350.0, 450.0)), ms(start, 70));
        let state = overlay.state();
        assert!(state.locked);
        assert_eq!(state.hovered, None);
        assert_eq!(state.selected.as_ref().unwrap().stable_id, "pricing-card");
        assert_eq!(page.doc.attribute(page.card, "data-inspector-selected"), Some("true"));
        assert!(!page.doc.has_class(page.card, "inspector-hover"));

        // Locked: hover events are dropped
        assert!(!overlay.handle_event(
            &mut page.doc,
            InputEvent::PointerMove(Point::new(550.0, 300.0)),
            ms(start, 80)
        ));
        overlay.tick(&mut page.doc, ms(start, 300));
        assert_eq!(overlay.state().hovered, None);
        assert!(overlay.state().invariants_hold());
    }

    #[test]
    fn test_select_mode_pick_reports_everywhere() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();

        overlay.announce_ready();
        assert!(overlay.handle_message(
            &mut page.doc,
            r#"{"type":"ENABLE_SELECTOR","returnUrl":"/admin/tours/9","stepIndex":2}"#
        ));
        assert_eq!(overlay.mode(), Mode::Select);

        assert!(overlay.handle_event(
            &mut page.doc,
            InputEvent::ContextMenu(Point::new(150.0, 220.0)),
            start
        ));

        assert_eq!(overlay.clipboard().contents(), Some("pricing-card"));
        assert!(overlay.state().toast.visible);

        let opener = overlay.opener().unwrap();
        assert_eq!(opener.messages()[0], OutboundMessage::SelectorReady);
        let report = opener.last_report().unwrap();
        // The heading resolves to its registered ancestor
        assert_eq!(report.stable_id.as_deref(), Some("pricing-card"));
        assert_eq!(report.selector, "main > section");
        assert_eq!(report.step_index, Some(2));
        assert_eq!(report.element_info.text_snippet, "Pro plan");

        let stored = load_selection(overlay.storage(), "inspector.lastSelection")
            .unwrap()
            .unwrap();
        assert_eq!(stored.return_url.as_deref(), Some("/admin/tours/9"));
        assert_eq!(stored.step_index, Some(2));

        overlay.tick(&mut page.doc, ms(start, 2000));
        assert!(!overlay.state().toast.visible);
    }

    #[test]
    fn test_clipboard_failure_is_not_fatal() {
        let mut page = page();
        let mut overlay: TestOverlay = Overlay::new(
            OverlayConfig::default(),
            Rectangle::new(0.0, 0.0, 1200.0, 800.0),
            MemoryClipboard::failing(),
            MemoryStorage::new(),
        );
        let now = Instant::now();
        overlay.set_mode(&mut page.doc, Mode::Select);

        overlay.handle_event(&mut page.doc, InputEvent::ContextMenu(Point::new(350.0, 450.0)), now);
        assert!(overlay.state().toast.visible);
        assert_eq!(
            overlay.last_report().unwrap().stable_id.as_deref(),
            Some("pricing-card")
        );
    }

    #[test]
    fn test_context_menu_in_design_clears_selection() {
        let mut page = page();
        let mut overlay = overlay();
        let now = Instant::now();
        select_card(&mut overlay, &mut page, now);

        overlay.handle_event(&mut page.doc, InputEvent::ContextMenu(Point::new(10.0, 10.0)), now);
        assert_eq!(overlay.state().selected, None);
        assert!(!overlay.state().locked);
        assert_eq!(page.doc.attribute(page.card, "data-inspector-selected"), None);
    }

    #[test]
    fn test_escape_deactivates_and_unbinds() {
        let mut page = page();
        let mut overlay = overlay();
        let now = Instant::now();
        select_card(&mut overlay, &mut page, now);

        assert!(overlay.handle_event(&mut page.doc, InputEvent::KeyDown(Key::Escape), now));
        assert_eq!(overlay.mode(), Mode::Inactive);
        assert_eq!(overlay.state().selected, None);
        assert!(!overlay.surface().is_bound());
        assert_eq!(page.doc.attribute(page.card, "data-inspector-selected"), None);
    }

    #[test]
    fn test_resize_through_handle() {
        let mut page = page();
        let mut overlay = overlay();
        let now = Instant::now();
        select_card(&mut overlay, &mut page, now);

        // South-east corner of 100,200 300x300
        assert!(overlay.handle_event(&mut page.doc, press(Point::new(400.0, 500.0)), now));
        overlay.handle_event(&mut page.doc, InputEvent::PointerMove(Point::new(500.0, 450.0)), now);

        // Preview only until release
        assert_eq!(page.doc.measure(page.card).unwrap().width, 300.0);
        assert_eq!(
            overlay.frame(&page.doc).resize_preview,
            Some(Rectangle::new(100.0, 200.0, 400.0, 250.0))
        );

        overlay.handle_event(&mut page.doc, InputEvent::PointerUp(Point::new(500.0, 450.0)), now);
        let card = page.doc.measure(page.card).unwrap();
        assert_eq!(card, Rectangle::new(100.0, 200.0, 400.0, 250.0));
        assert_eq!(overlay.state().selected.as_ref().unwrap().bounds, card);

        // Title was 200x40 of 300x300
        let title = page.doc.measure(page.title).unwrap();
        assert!((title.width - 200.0 / 300.0 * 400.0).abs() < 0.01);
        assert!((title.height - 40.0 / 300.0 * 250.0).abs() < 0.01);

        // The click generated by the release does not reselect
        overlay.handle_event(&mut page.doc, InputEvent::Click(Point::new(500.0, 450.0)), now);
        assert_eq!(overlay.state().selected.as_ref().unwrap().node, page.card);
    }

    #[test]
    fn test_transfer_released_early_changes_nothing() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        select_card(&mut overlay, &mut page, start);
        page.doc.clear_events();

        assert!(overlay.handle_event(&mut page.doc, press(Point::new(150.0, 230.0)), start));
        overlay.tick(&mut page.doc, ms(start, 1800));
        assert_eq!(overlay.state().transfer.progress, 60.0);

        overlay.handle_event(&mut page.doc, InputEvent::PointerUp(Point::new(600.0, 300.0)), ms(start, 1810));
        assert_eq!(page.doc.parent_of(page.title), Some(page.card));
        assert!(page.doc.events().iter().all(|e| !e.event.is_structural()));
        assert_eq!(overlay.state().transfer, Default::default());
        assert!(overlay.transfer().is_idle());
    }

    #[test]
    fn test_transfer_commit_moves_exactly_one_node() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        select_card(&mut overlay, &mut page, start);
        page.doc.clear_events();

        overlay.handle_event(&mut page.doc, press(Point::new(150.0, 230.0)), start);
        for step in 1..=30 {
            overlay.tick(&mut page.doc, ms(start, step * 100));
        }
        assert!(overlay.state().transfer.active);
        assert_eq!(overlay.state().transfer.progress, 100.0);

        overlay.handle_event(&mut page.doc, InputEvent::PointerMove(Point::new(600.0, 300.0)), ms(start, 3050));
        let preview = overlay.frame(&page.doc).drag_preview.unwrap();
        assert_eq!(preview.drop_target.unwrap().label, "aside#sidebar");

        overlay.handle_event(&mut page.doc, InputEvent::PointerUp(Point::new(600.0, 300.0)), ms(start, 3100));

        assert_eq!(page.doc.parent_of(page.title), Some(page.sidebar));
        let reparents = page
            .doc
            .events()
            .iter()
            .filter(|e| matches!(e.event, EventType::NodeReparented { .. }))
            .count();
        assert_eq!(reparents, 1);

        let toast = &overlay.state().toast;
        assert!(toast.visible);
        assert_eq!(toast.message, "Moved into aside#sidebar");
        assert_eq!(toast.detail, "main > section > h2 is now aside#sidebar > h2");
        assert_eq!(overlay.state().transfer, Default::default());

        // The click after an armed drop is swallowed
        overlay.handle_event(&mut page.doc, InputEvent::Click(Point::new(600.0, 300.0)), ms(start, 3110));
        assert_eq!(overlay.state().selected.as_ref().unwrap().node, page.card);
    }

    #[test]
    fn test_armed_transfer_cancelled_when_child_detached() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        select_card(&mut overlay, &mut page, start);

        overlay.handle_event(&mut page.doc, press(Point::new(150.0, 230.0)), start);
        for step in 1..=30 {
            overlay.tick(&mut page.doc, ms(start, step * 100));
        }
        assert!(overlay.state().transfer.active);
        page.doc.clear_events();

        page.doc.remove(page.title).unwrap();
        overlay.tick(&mut page.doc, ms(start, 3100));

        assert!(overlay.transfer().is_idle());
        assert_eq!(overlay.state().transfer, Default::default());
        assert_eq!(overlay.surface().captured(), None);

        // A late release has nothing left to drop
        overlay.handle_event(&mut page.doc, InputEvent::PointerUp(Point::new(600.0, 300.0)), ms(start, 3150));
        assert!(!page
            .doc
            .events()
            .iter()
            .any(|e| matches!(e.event, EventType::NodeReparented { .. })));
        assert!(!overlay.state().toast.visible);
    }

    #[test]
    fn test_mode_change_abandons_scan() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        select_card(&mut overlay, &mut page, start);

        overlay.handle_event(&mut page.doc, press(Point::new(150.0, 230.0)), start);
        overlay.tick(&mut page.doc, ms(start, 500));
        overlay.apply_toolbar_action(&mut page.doc, ToolbarAction::SelectMode);

        assert!(overlay.transfer().is_idle());
        assert_eq!(overlay.state().transfer, Default::default());
        assert_eq!(overlay.surface().captured(), None);

        overlay.tick(&mut page.doc, ms(start, 5000));
        assert_eq!(page.doc.parent_of(page.title), Some(page.card));
    }

    #[test]
    fn test_selected_node_removed_clears_selection() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        select_card(&mut overlay, &mut page, start);

        page.doc.remove(page.card).unwrap();
        overlay.tick(&mut page.doc, ms(start, 10));
        assert_eq!(overlay.state().selected, None);
        assert!(overlay.frame(&page.doc).selection.is_none());
    }

    #[test]
    fn test_inspector_edits() {
        let mut page = page();
        let mut overlay = overlay();
        let now = Instant::now();
        assert!(overlay
            .apply_inspector_field(&mut page.doc, InspectorField::Color, "red")
            .is_err());

        select_card(&mut overlay, &mut page, now);
        assert!(overlay.panel_visible(PanelKind::Inspector));

        overlay
            .apply_inspector_field(&mut page.doc, InspectorField::BackgroundColor, "#FFF")
            .unwrap();
        assert_eq!(page.doc.style(page.card, "background-color"), Some("#fff"));

        overlay
            .apply_inspector_field(&mut page.doc, InspectorField::Width, "420px")
            .unwrap();
        assert_eq!(page.doc.measure(page.card).unwrap().width, 420.0);
        assert_eq!(overlay.state().selected.as_ref().unwrap().bounds.width, 420.0);

        assert!(overlay
            .apply_inspector_field(&mut page.doc, InspectorField::Padding, "wide")
            .is_err());
    }

    #[test]
    fn test_toolbar_drag_and_buttons() {
        let mut page = page();
        let mut overlay = overlay();
        let now = Instant::now();
        overlay.set_mode(&mut page.doc, Mode::Select);

        let origin = overlay.panel(PanelKind::Toolbar).position();
        // Between the buttons' bottom edge and the panel edge
        let grab = Point::new(origin.x + 4.0, origin.y + 38.0);
        assert!(overlay.handle_event(&mut page.doc, press(grab), now));
        overlay.handle_event(&mut page.doc, InputEvent::PointerMove(Point::new(grab.x - 100.0, 500.0)), now);
        overlay.handle_event(&mut page.doc, InputEvent::PointerUp(Point::new(grab.x - 100.0, 500.0)), now);
        assert_eq!(
            overlay.panel(PanelKind::Toolbar).position(),
            Point::new(origin.x - 100.0, origin.y)
        );

        // Second button switches to Design
        let origin = overlay.panel(PanelKind::Toolbar).position();
        let design = Point::new(origin.x + 8.0 + 88.0 + 10.0, origin.y + 20.0);
        assert!(overlay.handle_event(&mut page.doc, press(design), now));
        assert_eq!(overlay.surface().captured(), None);
        overlay.handle_event(&mut page.doc, InputEvent::PointerUp(design), now);
        overlay.handle_event(&mut page.doc, InputEvent::Click(design), now);
        assert_eq!(overlay.mode(), Mode::Design);
    }

    #[test]
    fn test_activation_from_url() {
        let mut page = page();
        let mut overlay = overlay();

        assert!(!overlay.activate_from_url(&mut page.doc, "https://app.example/plans"));
        assert!(overlay.activate_from_url(
            &mut page.doc,
            "https://app.example/plans?enableSelector=1&stepIndex=5"
        ));
        assert_eq!(overlay.mode(), Mode::Select);
        assert_eq!(overlay.request().unwrap().step_index, Some(5));
        assert_eq!(overlay.surface().bind_count(), 1);

        overlay.deactivate(&mut page.doc);
        assert!(overlay.request().is_none());
    }

    #[test]
    fn test_unmount_cancels_toast() {
        let mut page = page();
        let mut overlay = overlay();
        let start = Instant::now();
        overlay.set_mode(&mut page.doc, Mode::Select);
        overlay.handle_event(&mut page.doc, InputEvent::ContextMenu(Point::new(350.0, 450.0)), start);
        assert!(overlay.state().toast.visible);

        overlay.unmount(&mut page.doc);
        assert!(!overlay.state().toast.visible);
        assert!(!overlay.surface().is_bound());
        let revision = overlay.store().revision();
        overlay.tick(&mut page.doc, ms(start, 5000));
        assert_eq!(overlay.store().revision(), revision);
    }
}

use anyhow::Result;
use live_inspector::demo::sample_page;
use live_inspector::{
    InputEvent, MemoryClipboard, MemoryStorage, Overlay, OverlayConfig, Point, PointerButton,
    RecordingOpener, Rectangle, ToolbarAction,
};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Live Inspector - Scripted Session");
    println!("================================\n");

    let viewport = Rectangle::new(0.0, 0.0, 1280.0, 800.0);
    let mut page = sample_page(viewport)?;
    let config = OverlayConfig::default();
    let mut overlay = Overlay::new(config, viewport, MemoryClipboard::new(), MemoryStorage::new())
        .with_opener(RecordingOpener::new());

    let start = Instant::now();
    let at = |millis: u64| start + Duration::from_millis(millis);

    // Activation through the page URL, as an opener would link to us
    overlay.announce_ready();
    overlay.activate_from_url(
        &mut page.doc,
        "https://acme.example/pricing?enableSelector=1&returnUrl=%2Fadmin%2Ftours%2F4&stepIndex=2",
    );
    println!("✓ Activated in {:?} mode", overlay.mode());

    // Hover the first call-to-action and let the debounce settle
    let cta = page.doc.measure(page.cta).unwrap_or_default().center();
    overlay.handle_event(&mut page.doc, InputEvent::PointerMove(cta), at(0));
    overlay.tick(&mut page.doc, at(60));
    if let Some(hovered) = &overlay.state().hovered {
        println!("✓ Hovering {}", hovered.stable_id);
    }

    // Right-click confirms the pick
    overlay.handle_event(&mut page.doc, InputEvent::ContextMenu(cta), at(100));
    if let Some(report) = overlay.last_report() {
        println!("\n📋 Pick reported:");
        println!("  └─ selector:  {}", report.selector);
        println!("  └─ stableId:  {:?}", report.stable_id);
        println!("  └─ stepIndex: {:?}", report.step_index);
        println!("  └─ clipboard: {:?}", overlay.clipboard().contents());
    }

    // Design mode: select the second card and resize it from the SE corner
    overlay.apply_toolbar_action(&mut page.doc, ToolbarAction::DesignMode);
    let card = page.cards[1];
    let card_box = page.doc.measure(card).unwrap_or_default();
    overlay.handle_event(&mut page.doc, InputEvent::Click(card_box.center()), at(200));
    println!(
        "\n✓ {:?} mode, selected {:?}",
        overlay.mode(),
        overlay.state().selected.as_ref().map(|t| &t.stable_id)
    );

    let corner = Point::new(card_box.right(), card_box.bottom());
    let dragged = Point::new(corner.x + 64.0, corner.y - 80.0);
    overlay.handle_event(
        &mut page.doc,
        InputEvent::PointerDown {
            position: corner,
            button: PointerButton::Primary,
        },
        at(300),
    );
    overlay.handle_event(&mut page.doc, InputEvent::PointerMove(dragged), at(320));
    overlay.handle_event(&mut page.doc, InputEvent::PointerUp(dragged), at(340));
    // The click a browser emits after the drag is swallowed
    overlay.handle_event(&mut page.doc, InputEvent::Click(dragged), at(341));
    let resized = page.doc.measure(card).unwrap_or_default();
    println!("✓ Resized card to {}×{}", resized.width, resized.height);

    // Hold on the first card's button until the transfer arms, then drop it in the sidebar
    let first_card = page.doc.measure(page.cards[0]).unwrap_or_default().center();
    overlay.handle_event(&mut page.doc, InputEvent::Click(first_card), at(400));
    let cta = page.doc.measure(page.cta).unwrap_or_default().center();
    overlay.handle_event(
        &mut page.doc,
        InputEvent::PointerDown {
            position: cta,
            button: PointerButton::Primary,
        },
        at(500),
    );
    for step in 1..=30 {
        overlay.tick(&mut page.doc, at(500 + step * 100));
    }
    println!("\n✓ Transfer armed: {}", overlay.state().transfer.active);

    let drop = page.doc.measure(page.sidebar).unwrap_or_default();
    let drop = Point::new(drop.center().x, drop.bottom() - 40.0);
    overlay.handle_event(&mut page.doc, InputEvent::PointerMove(drop), at(3600));
    overlay.handle_event(&mut page.doc, InputEvent::PointerUp(drop), at(3650));
    let toast = &overlay.state().toast;
    println!("✓ {} ({})", toast.message, toast.detail);

    overlay.apply_toolbar_action(&mut page.doc, ToolbarAction::Close);
    overlay.tick(&mut page.doc, at(6000));

    println!("\n📊 Session Summary:");
    println!("  └─ Mode: {:?}", overlay.mode());
    println!("  └─ Store revisions: {}", overlay.store().revision());
    println!("  └─ Tree events logged: {}", page.doc.events().len());
    println!(
        "  └─ Opener messages: {}",
        overlay.opener().map_or(0, |o| o.messages().len())
    );
    println!("\n✅ Session complete.\n");
    Ok(())
}

use anyhow::{anyhow, Result};
use eframe::egui;
use live_inspector::{JsonFileStorage, LiveInspectorApp, OverlayConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("live_inspector=info")),
        )
        .init();

    // Optional config file as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => OverlayConfig::load(&PathBuf::from(path))?,
        None => OverlayConfig::default(),
    };

    let data_dir = std::env::temp_dir().join("live_inspector");
    let storage = JsonFileStorage::open(&data_dir.join("storage.json"))?;
    let app = LiveInspectorApp::new(config, storage, data_dir.join("events.jsonl"))?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 840.0])
            .with_title("Live Inspector"),
        ..Default::default()
    };

    eframe::run_native(
        "Live Inspector",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("GUI failed: {}", e))
}

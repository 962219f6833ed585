use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

/// Timing and geometry constants for the overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// How long a hover candidate must stay unchanged before it is committed
    pub hover_debounce_ms: u64,

    /// Interval of the hold-to-confirm progress timer
    pub scan_tick_ms: u64,

    /// Total hold time before a child transfer arms
    pub scan_duration_ms: u64,

    pub toast_duration_ms: u64,

    /// Minimum width and height a resize can request
    pub min_size: f32,

    /// Edge length of the square resize handles
    pub handle_size: f32,

    /// Ancestor levels searched for a registry annotation
    pub max_ancestor_depth: usize,

    /// Attribute the host application uses for stable ids
    pub registry_attribute: String,

    /// Storage key for the last reported selection
    pub storage_key: String,

    pub text_snippet_len: usize,

    /// Class toggled on the committed hover target
    pub hover_class: String,

    /// Marker attribute placed on the selected node
    pub selected_marker: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            hover_debounce_ms: 50,
            scan_tick_ms: 100,
            scan_duration_ms: 3000,
            toast_duration_ms: 2000,
            min_size: 20.0,
            handle_size: 8.0,
            max_ancestor_depth: 4,
            registry_attribute: "data-registry-id".to_string(),
            storage_key: "inspector.lastSelection".to_string(),
            text_snippet_len: 50,
            hover_class: "inspector-hover".to_string(),
            selected_marker: "data-inspector-selected".to_string(),
        }
    }
}

impl OverlayConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open overlay config: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse overlay config from: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create overlay config: {}", path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .with_context(|| format!("Failed to write overlay config to: {}", path.display()))?;
        Ok(())
    }

    /// Reject settings the timers and geometry cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.scan_tick_ms == 0 {
            return Err(anyhow!("scan_tick_ms must be greater than zero"));
        }
        if self.scan_duration_ms < self.scan_tick_ms {
            return Err(anyhow!("scan_duration_ms must be at least one scan tick"));
        }
        if self.min_size < 0.0 || self.handle_size <= 0.0 {
            return Err(anyhow!("min_size and handle_size must be positive"));
        }
        if self.registry_attribute.is_empty() {
            return Err(anyhow!("registry_attribute must not be empty"));
        }
        Ok(())
    }

    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }

    pub fn scan_tick(&self) -> Duration {
        Duration::from_millis(self.scan_tick_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// Number of ticks needed to reach 100% progress
    pub fn scan_steps(&self) -> u32 {
        (self.scan_duration_ms / self.scan_tick_ms.max(1)).max(1) as u32
    }
}

use anyhow::{anyhow, Result};

/// Destination for copied identifiers
pub trait ClipboardSink {
    fn copy_text(&mut self, text: &str) -> Result<()>;
}

/// The operating system clipboard
///
/// A fresh handle is opened per copy; some platforms drop clipboard
/// ownership when the handle goes away, which is fine for short ids.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| anyhow!("Clipboard unavailable: {}", e))?;
        clipboard
            .set_text(text)
            .map_err(|e| anyhow!("Clipboard write failed: {}", e))?;
        Ok(())
    }
}

/// Keeps copied text in memory; optionally refuses every write
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    history: Vec<String>,
    failing: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose writes always fail
    pub fn failing() -> Self {
        Self {
            history: Vec::new(),
            failing: true,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl ClipboardSink for MemoryClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        if self.failing {
            return Err(anyhow!("Clipboard write refused"));
        }
        self.history.push(text.to_string());
        Ok(())
    }
}

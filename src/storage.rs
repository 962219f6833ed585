use crate::handshake::StoredSelection;
use crate::TreeEvent;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Key/value persistence for the last reported selection
pub trait SelectionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: String) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// Write `selection` as JSON under `key`
pub fn store_selection(
    storage: &mut dyn SelectionStorage,
    key: &str,
    selection: &StoredSelection,
) -> Result<()> {
    let json = serde_json::to_string(selection).context("Failed to serialize selection")?;
    storage.set_item(key, json)
}

/// Read back the selection stored under `key`, if any
pub fn load_selection(storage: &dyn SelectionStorage, key: &str) -> Result<Option<StoredSelection>> {
    match storage.get_item(key)? {
        Some(json) => {
            let selection = serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse stored selection under: {}", key))?;
            Ok(Some(selection))
        }
        None => Ok(None),
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Items kept as one JSON object in a file, rewritten on every change
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl JsonFileStorage {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: &Path) -> Result<Self> {
        let items = if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open storage file: {}", path.display()))?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse storage from: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            items,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
        }
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create storage file: {}", self.path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.items)
            .with_context(|| format!("Failed to write storage to: {}", self.path.display()))?;
        Ok(())
    }
}

impl SelectionStorage for JsonFileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.items.insert(key.to_string(), value);
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Append-only JSON Lines log of tree events
#[derive(Debug, Clone)]
pub struct EventJournal {
    path: PathBuf,
}

impl EventJournal {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, events: &[TreeEvent]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create journal directory: {}", dir.display()))?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open event journal: {}", self.path.display()))?;

        let mut writer = BufWriter::new(file);
        for event in events {
            let json = serde_json::to_string(event).with_context(|| {
                format!("Failed to serialize event: {}", self.path.display())
            })?;
            writeln!(writer, "{}", json).with_context(|| {
                format!("Failed to write event to: {}", self.path.display())
            })?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to flush event journal: {}", self.path.display()))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<TreeEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open event journal: {}", self.path.display()))?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line.with_context(|| {
                format!("Failed to read line {} from: {}", line_num + 1, self.path.display())
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let event: TreeEvent = serde_json::from_str(&line).with_context(|| {
                format!(
                    "Failed to parse event on line {} from: {}",
                    line_num + 1,
                    self.path.display()
                )
            })?;
            events.push(event);
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Document, Rectangle};
    use chrono::Utc;
    use tempfile::TempDir;

    fn selection() -> StoredSelection {
        StoredSelection {
            selector: "main > section#pricing".to_string(),
            stable_id: Some("pricing-card".to_string()),
            step_index: Some(3),
            return_url: Some("/admin/tours/7".to_string()),
            selected_at: Utc::now(),
        }
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(load_selection(&storage, "last").unwrap(), None);

        let saved = selection();
        store_selection(&mut storage, "last", &saved).unwrap();
        assert_eq!(load_selection(&storage, "last").unwrap(), Some(saved));

        storage.remove_item("last").unwrap();
        assert_eq!(storage.get_item("last").unwrap(), None);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("storage.json");

        let saved = selection();
        {
            let mut storage = JsonFileStorage::open(&path).unwrap();
            store_selection(&mut storage, "inspector.lastSelection", &saved).unwrap();
        }

        let storage = JsonFileStorage::open(&path).unwrap();
        let loaded = load_selection(&storage, "inspector.lastSelection").unwrap();
        assert_eq!(loaded, Some(saved));
    }

    #[test]
    fn test_corrupted_storage_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(JsonFileStorage::open(&path).is_err());
    }

    #[test]
    fn test_event_journal() {
        let temp_dir = TempDir::new().unwrap();
        let journal = EventJournal::new(&temp_dir.path().join("events.jsonl"));
        assert!(journal.load().unwrap().is_empty());

        let mut doc = Document::new(Rectangle::new(0.0, 0.0, 400.0, 300.0));
        let root = doc.root();
        let node = doc
            .create_node(root, "div", Rectangle::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        doc.set_size(node, 50.0, 50.0).unwrap();

        journal.append(doc.events()).unwrap();
        journal.append(doc.events()).unwrap();

        let loaded = journal.load().unwrap();
        assert_eq!(loaded.len(), doc.events().len() * 2);
        assert_eq!(loaded[0].event, doc.events()[0].event);
    }
}

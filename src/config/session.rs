//! Session-scoped key-value storage
//!
//! Holds the open chapters and the shared version between page loads.
//! Values are JSON strings; the store itself is schema-agnostic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Key-value store scoped to one reading session
pub trait SessionStore {
    /// Read a value
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a value
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// In-memory store that lives as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds nothing
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object on disk
///
/// Lets the headless client resume a session across invocations.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: HashMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`; a missing or unreadable file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed session file {:?}: {}", path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Self { path, items }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(&self.items)
            .with_context(|| "Failed to serialize session")?;

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {:?}", self.path))?;

        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        store.set_item("versionId", "v1").unwrap();
        assert_eq!(store.get_item("versionId"), Some("v1".into()));

        store.remove_item("versionId").unwrap();
        assert!(store.get_item("versionId").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut store = FileStore::open(&path);
        store.set_item("chapters", "[]").unwrap();
        drop(store);

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get_item("chapters"), Some("[]".into()));
    }

    #[test]
    fn file_store_ignores_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path);
        assert!(store.get_item("chapters").is_none());
    }

    #[test]
    fn file_store_remove_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = FileStore::open(&path);
        store.set_item("chapters", "[]").unwrap();
        store.set_item("versionId", "v2").unwrap();
        store.remove_item("chapters").unwrap();

        let reopened = FileStore::open(&path);
        assert!(reopened.get_item("chapters").is_none());
        assert_eq!(reopened.get_item("versionId"), Some("v2".into()));
    }
}

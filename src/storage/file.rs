//! File-backed key-value store.
//!
//! Keeps every item in memory and rewrites one JSON object file after each
//! mutation, mirroring a browser's per-origin storage on disk.

use super::KeyValueStore;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default storage file name inside the data directory
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// Persistent store backed by a single JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    ///
    /// An unreadable or malformed file is logged and treated as empty; it is
    /// replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let items = if path.exists() {
            let content = fs::read(&path)?;
            if content.iter().all(u8::is_ascii_whitespace) {
                BTreeMap::new()
            } else {
                match serde_json::from_slice::<BTreeMap<String, String>>(&content) {
                    Ok(items) => items,
                    Err(e) => {
                        warn!(path = ?path, error = %e, "Storage file is malformed, starting empty");
                        BTreeMap::new()
                    }
                }
            }
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            BTreeMap::new()
        };

        debug!(path = ?path, items = items.len(), "Opened storage file");

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str, items: &BTreeMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, content).map_err(|e| {
            warn!(path = ?self.path, error = %e, "Failed to write storage file");
            Error::Storage {
                key: key.to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write();
        items.insert(key.to_string(), value.to_string());
        self.persist(key, &items)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.write();
        if items.remove(key).is_some() {
            self.persist(key, &items)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");

        let store = FileStore::open(&path).expect("open");
        store.set_item("analyticsFilters", "[]").expect("set");
        store.set_item("other", "x").expect("set");
        store.remove_item("other").expect("remove");
        drop(store);

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get_item("analyticsFilters").as_deref(), Some("[]"));
        assert_eq!(reopened.get_item("other"), None);
    }

    #[test]
    fn malformed_file_opens_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").expect("write");

        let store = FileStore::open(&path).expect("open");
        assert!(store.keys().is_empty());

        store.set_item("a", "1").expect("set");
        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get_item("a").as_deref(), Some("1"));

        fs::write(&path, [0xff, 0xfe, b'{', b'}']).expect("write non-utf8");
        let store = FileStore::open(&path).expect("open non-utf8");
        assert!(store.keys().is_empty());
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("storage.json");

        let store = FileStore::open(&path).expect("open");
        store.set_item("a", "1").expect("set");
        assert!(path.exists());
    }
}

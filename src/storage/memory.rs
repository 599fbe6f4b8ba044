//! In-memory key-value store with an optional byte quota.

use super::KeyValueStore;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Volatile store, used for tests and ephemeral sessions
///
/// With a quota set, writes that would push the total size of keys and
/// values past the limit fail the same way a full browser storage does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store without a quota
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes beyond `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total bytes used by keys and values
    pub fn used_bytes(&self) -> usize {
        self.items
            .read()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write();

        if let Some(quota) = self.quota_bytes {
            let current: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            if current + key.len() + value.len() > quota {
                return Err(Error::Storage {
                    key: key.to_string(),
                    message: format!("quota of {quota} bytes exceeded"),
                });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }
}

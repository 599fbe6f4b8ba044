//! Configuration Repository
//!
//! CRUD over the map of saved scenarios. The whole map lives under one storage
//! key and every mutation rewrites it. Entries stay raw JSON until read, so
//! fields this client does not know survive a rewrite.

use crate::constants::SAVED_CONFIGURATIONS_KEY;
use crate::domain::scenario::{Decoded, NamedConfiguration, decode_json_text};
use crate::error::{Error, Result};
use crate::helpers::normalize_scenario_name;
use crate::storage::SharedStore;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Saved scenarios keyed by name
#[derive(Clone)]
pub struct ConfigurationRepository {
    store: SharedStore,
}

impl ConfigurationRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Decode the stored map; missing, malformed, or non-object blobs are reported
    fn load_map(&self) -> Decoded<Map<String, Value>> {
        let raw = self.store.get_item(SAVED_CONFIGURATIONS_KEY);
        match decode_json_text(raw.as_deref()) {
            Decoded::Valid(Value::Object(map)) => Decoded::Valid(map),
            Decoded::Valid(_) => Decoded::Invalid {
                reason: "stored scenarios are not a JSON object".to_string(),
            },
            Decoded::Missing => Decoded::Missing,
            Decoded::Invalid { reason } => Decoded::Invalid { reason },
        }
    }

    /// Stored map, defaulting to empty
    fn read_map(&self) -> Map<String, Value> {
        match self.load_map() {
            Decoded::Valid(map) => map,
            Decoded::Missing => {
                debug!(key = SAVED_CONFIGURATIONS_KEY, "No saved scenarios yet");
                Map::new()
            }
            Decoded::Invalid { reason } => {
                warn!(key = SAVED_CONFIGURATIONS_KEY, %reason, "Ignoring unreadable saved scenarios");
                Map::new()
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        let text = serde_json::to_string(map)?;
        self.store
            .set_item(SAVED_CONFIGURATIONS_KEY, &text)
            .inspect_err(|e| {
                warn!(key = SAVED_CONFIGURATIONS_KEY, error = %e, "Failed to persist saved scenarios");
            })
    }

    /// Every scenario name, ascending
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_map().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of saved scenarios
    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        normalize_scenario_name(name).is_some_and(|name| self.read_map().contains_key(name))
    }

    /// Stored JSON of one scenario, untouched
    pub fn get_raw(&self, name: &str) -> Option<Value> {
        let name = normalize_scenario_name(name)?;
        self.read_map().remove(name)
    }

    /// Decoded scenario; malformed entries come back as empty scenarios
    pub fn get(&self, name: &str) -> Option<NamedConfiguration> {
        let raw = self.get_raw(name)?;
        match NamedConfiguration::from_value(&raw) {
            Decoded::Valid(config) => Some(config),
            Decoded::Missing => Some(NamedConfiguration::default()),
            Decoded::Invalid { reason } => {
                warn!(scenario = name.trim(), %reason, "Saved scenario is malformed, using empty settings");
                Some(NamedConfiguration::default())
            }
        }
    }

    /// Insert or overwrite a scenario; returns the trimmed name it was stored under
    pub fn put(&self, name: &str, configuration: &NamedConfiguration) -> Result<String> {
        self.put_raw(name, configuration.to_value()?)
    }

    /// Insert or overwrite raw scenario JSON (used by import)
    pub fn put_raw(&self, name: &str, value: Value) -> Result<String> {
        let name = normalize_scenario_name(name).ok_or(Error::InvalidName)?;

        let mut map = self.read_map();
        let replaced = map.insert(name.to_string(), value).is_some();
        self.write_map(&map)?;

        info!(scenario = name, replaced, "Saved scenario");
        Ok(name.to_string())
    }

    /// Remove a scenario; returns whether one was removed
    pub fn delete(&self, name: &str) -> Result<bool> {
        let name = normalize_scenario_name(name).ok_or(Error::InvalidName)?;

        let mut map = self.read_map();
        if map.remove(name).is_none() {
            debug!(scenario = name, "Nothing to delete");
            return Ok(false);
        }
        self.write_map(&map)?;

        info!(scenario = name, "Deleted scenario");
        Ok(true)
    }
}

impl std::fmt::Debug for ConfigurationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationRepository")
            .field("scenarios", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn repo() -> (Arc<MemoryStore>, ConfigurationRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = ConfigurationRepository::new(store.clone());
        (store, repo)
    }

    fn config_with_filter(field: &str) -> NamedConfiguration {
        NamedConfiguration {
            filters: vec![json!({"field": field, "op": ">", "value": 1})],
            ..Default::default()
        }
    }

    #[test]
    fn names_are_sorted_regardless_of_insertion() {
        let (_, repo) = repo();
        for name in ["zeta", "Alpha", "beta", "Default"] {
            repo.put(name, &NamedConfiguration::default()).expect("put");
        }
        assert_eq!(repo.names(), vec!["Alpha", "Default", "beta", "zeta"]);
    }

    #[test]
    fn malformed_storage_reads_as_empty() {
        let (store, repo) = repo();
        store
            .set_item(SAVED_CONFIGURATIONS_KEY, "not json")
            .expect("seed");

        assert!(repo.names().is_empty());
        assert!(repo.get("anything").is_none());

        store.set_item(SAVED_CONFIGURATIONS_KEY, "[1,2]").expect("seed");
        assert!(repo.names().is_empty());
    }

    #[test]
    fn put_then_get_returns_same_configuration() {
        let (_, repo) = repo();
        let config = config_with_filter("price");
        let stored = repo.put("  Growth ", &config).expect("put");

        assert_eq!(stored, "Growth");
        assert_eq!(repo.get("Growth"), Some(config));
        assert!(repo.contains("Growth"));
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let (_, repo) = repo();
        repo.put("X", &config_with_filter("price")).expect("put");
        repo.put("X", &config_with_filter("volume")).expect("overwrite");

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.get("X"), Some(config_with_filter("volume")));
    }

    #[test]
    fn delete_reports_whether_removed() {
        let (_, repo) = repo();
        repo.put("X", &NamedConfiguration::default()).expect("put");

        assert!(repo.delete("X").expect("delete"));
        assert!(!repo.delete("X").expect("second delete"));
        assert!(repo.is_empty());
    }

    #[test]
    fn blank_names_are_rejected_without_side_effects() {
        let (store, repo) = repo();
        assert!(matches!(
            repo.put("   ", &NamedConfiguration::default()),
            Err(Error::InvalidName)
        ));
        assert!(matches!(repo.delete(""), Err(Error::InvalidName)));
        assert_eq!(store.get_item(SAVED_CONFIGURATIONS_KEY), None);
    }

    #[test]
    fn names_are_case_sensitive() {
        let (_, repo) = repo();
        repo.put("default", &NamedConfiguration::default()).expect("put");
        assert!(!repo.contains("Default"));
    }

    #[test]
    fn malformed_entry_decodes_to_empty_configuration() {
        let (store, repo) = repo();
        store
            .set_item(SAVED_CONFIGURATIONS_KEY, r#"{"Broken": 42, "Partial": {"rules": [1]}}"#)
            .expect("seed");

        assert_eq!(repo.get("Broken"), Some(NamedConfiguration::default()));
        let partial = repo.get("Partial").expect("partial");
        assert_eq!(partial.rules, vec![json!(1)]);
        assert!(partial.filters.is_empty());
    }

    #[test]
    fn unknown_fields_survive_rewrites() {
        let (_, repo) = repo();
        repo.put_raw("Imported", json!({"filters": [], "rules": [], "fieldSettings": {}, "note": "q3"}))
            .expect("put raw");
        repo.put("Other", &NamedConfiguration::default()).expect("put");

        assert_eq!(repo.get_raw("Imported").expect("raw")["note"], json!("q3"));
    }

    #[test]
    fn write_failure_is_reported() {
        let store = Arc::new(MemoryStore::with_quota(16));
        let repo = ConfigurationRepository::new(store);
        let err = repo
            .put("Big", &config_with_filter("price"))
            .expect_err("over quota");
        assert!(matches!(err, Error::Storage { .. }));
        assert!(repo.names().is_empty());
    }
}

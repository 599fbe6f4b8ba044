//! Active Settings Bridge
//!
//! The live settings the rest of the application reads from, one storage key
//! per slice, plus the two lifecycle markers (active scenario name and the
//! modified flag). This is a separate storage domain from the saved scenarios;
//! only the lifecycle controller copies between the two.

use crate::constants::{
    ACTIVE_CONFIGURATION_KEY, LIVE_ENABLED_KEY, LIVE_FILTERS_KEY, LIVE_FORMATS_KEY,
    LIVE_RULES_KEY, LIVE_TIPS_KEY, MODIFIED_FLAG_KEY, POST_TRANSFORM_ENABLED_KEY,
    POST_TRANSFORM_FORMATS_KEY, POST_TRANSFORM_TIPS_KEY,
};
use crate::domain::scenario::{
    Decoded, FieldSettings, NamedConfiguration, decode_json_text, decode_list, decode_map,
};
use crate::error::Result;
use crate::storage::SharedStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Storage keys of one three-map field settings group
struct FieldSettingsKeys {
    enabled: &'static str,
    formats: &'static str,
    tips: &'static str,
}

const PRE_TRANSFORM_KEYS: FieldSettingsKeys = FieldSettingsKeys {
    enabled: LIVE_ENABLED_KEY,
    formats: LIVE_FORMATS_KEY,
    tips: LIVE_TIPS_KEY,
};

const POST_TRANSFORM_KEYS: FieldSettingsKeys = FieldSettingsKeys {
    enabled: POST_TRANSFORM_ENABLED_KEY,
    formats: POST_TRANSFORM_FORMATS_KEY,
    tips: POST_TRANSFORM_TIPS_KEY,
};

/// Reader/writer for the live settings keys
#[derive(Clone)]
pub struct ActiveSettingsBridge {
    store: SharedStore,
}

impl ActiveSettingsBridge {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    // ==================== Decoding ====================

    fn read_json(&self, key: &str) -> Decoded<Value> {
        let decoded = decode_json_text(self.store.get_item(key).as_deref());
        if let Decoded::Invalid { reason } = &decoded {
            warn!(key, %reason, "Live setting is not valid JSON");
        }
        decoded
    }

    fn read_list(&self, key: &str) -> Vec<Value> {
        let raw = self.read_json(key).ok();
        let decoded = decode_list(raw.as_ref());
        if let Decoded::Invalid { reason } = &decoded {
            debug!(key, %reason, "Live list setting defaulted");
        }
        decoded.into_value()
    }

    fn read_map<T: DeserializeOwned>(&self, key: &str) -> BTreeMap<String, T> {
        let raw = self.read_json(key).ok();
        let decoded = decode_map(raw.as_ref());
        if let Decoded::Invalid { reason } = &decoded {
            debug!(key, %reason, "Live map setting defaulted");
        }
        decoded.into_value()
    }

    fn read_field_settings(&self, keys: &FieldSettingsKeys) -> FieldSettings {
        FieldSettings {
            enabled: self.read_map(keys.enabled),
            formats: self.read_map(keys.formats),
            tips: self.read_map(keys.tips),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.store.set_item(key, &text).inspect_err(|e| {
            warn!(key, error = %e, "Failed to write live setting");
        })
    }

    fn write_field_settings(&self, keys: &FieldSettingsKeys, settings: &FieldSettings) -> Result<()> {
        self.write_json(keys.enabled, &settings.enabled)?;
        self.write_json(keys.formats, &settings.formats)?;
        self.write_json(keys.tips, &settings.tips)
    }

    // ==================== Live Settings ====================

    /// Snapshot of every live slice, each defaulted to empty when unreadable
    pub fn read_live_settings(&self) -> NamedConfiguration {
        NamedConfiguration {
            filters: self.read_list(LIVE_FILTERS_KEY),
            field_settings: self.read_field_settings(&PRE_TRANSFORM_KEYS),
            rules: self.read_list(LIVE_RULES_KEY),
            post_transform_field_settings: self.read_field_settings(&POST_TRANSFORM_KEYS),
        }
    }

    /// Push a scenario into the live keys and clear the modified flag
    ///
    /// Slices written before a failing write are not rolled back.
    pub fn write_live_settings(&self, configuration: &NamedConfiguration) -> Result<()> {
        self.set_filters(&configuration.filters)?;
        self.set_field_settings(&configuration.field_settings)?;
        self.set_rules(&configuration.rules)?;
        self.set_post_transform_settings(&configuration.post_transform_field_settings)?;
        self.set_modified(false)
    }

    pub fn filters(&self) -> Vec<Value> {
        self.read_list(LIVE_FILTERS_KEY)
    }

    pub fn rules(&self) -> Vec<Value> {
        self.read_list(LIVE_RULES_KEY)
    }

    pub fn field_settings(&self) -> FieldSettings {
        self.read_field_settings(&PRE_TRANSFORM_KEYS)
    }

    pub fn post_transform_settings(&self) -> FieldSettings {
        self.read_field_settings(&POST_TRANSFORM_KEYS)
    }

    pub fn set_filters(&self, filters: &[Value]) -> Result<()> {
        self.write_json(LIVE_FILTERS_KEY, filters)
    }

    pub fn set_rules(&self, rules: &[Value]) -> Result<()> {
        self.write_json(LIVE_RULES_KEY, rules)
    }

    pub fn set_field_settings(&self, settings: &FieldSettings) -> Result<()> {
        self.write_field_settings(&PRE_TRANSFORM_KEYS, settings)
    }

    pub fn set_post_transform_settings(&self, settings: &FieldSettings) -> Result<()> {
        self.write_field_settings(&POST_TRANSFORM_KEYS, settings)
    }

    // ==================== Lifecycle Markers ====================

    /// Name of the scenario the live settings are based on
    pub fn active_name(&self) -> Option<String> {
        self.store
            .get_item(ACTIVE_CONFIGURATION_KEY)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    pub fn set_active_name(&self, name: &str) -> Result<()> {
        self.store.set_item(ACTIVE_CONFIGURATION_KEY, name)
    }

    pub fn clear_active_name(&self) -> Result<()> {
        self.store.remove_item(ACTIVE_CONFIGURATION_KEY)
    }

    /// Whether live settings diverged from the active scenario
    pub fn is_modified(&self) -> bool {
        self.store.get_item(MODIFIED_FLAG_KEY).as_deref() == Some("true")
    }

    pub fn set_modified(&self, modified: bool) -> Result<()> {
        self.store
            .set_item(MODIFIED_FLAG_KEY, if modified { "true" } else { "false" })
    }

    /// Remove the modified flag entirely
    pub fn clear_modified(&self) -> Result<()> {
        self.store.remove_item(MODIFIED_FLAG_KEY)
    }

    /// Whether the modified flag key exists at all
    pub fn has_modified_flag(&self) -> bool {
        self.store.get_item(MODIFIED_FLAG_KEY).is_some()
    }
}

impl std::fmt::Debug for ActiveSettingsBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSettingsBridge")
            .field("active", &self.active_name())
            .field("modified", &self.is_modified())
            .finish()
    }
}

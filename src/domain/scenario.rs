//! Scenario - Named Analytics Configurations
//!
//! A scenario is a snapshot of the analytics settings: filters, per-field
//! settings, transformation rules, and per-field settings for fields that only
//! exist after transformation. Filters and rules are opaque JSON owned by the
//! filter and transform modules.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Keys an imported scenario file must carry at top level
pub const REQUIRED_IMPORT_KEYS: [&str; 3] = ["filters", "rules", "fieldSettings"];

// ==================== Decoding ====================

/// Outcome of decoding one value read from storage
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// Value present with the expected shape
    Valid(T),
    /// Nothing stored
    Missing,
    /// Something stored, but unusable
    Invalid { reason: String },
}

impl<T: Default> Decoded<T> {
    /// The decoded value, or the empty default
    pub fn into_value(self) -> T {
        match self {
            Decoded::Valid(value) => value,
            Decoded::Missing | Decoded::Invalid { .. } => T::default(),
        }
    }
}

impl<T> Decoded<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Decoded::Valid(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Decoded::Invalid { .. })
    }

    /// The decoded value, if valid
    pub fn ok(self) -> Option<T> {
        match self {
            Decoded::Valid(value) => Some(value),
            _ => None,
        }
    }

    /// Map the valid value, keeping missing/invalid as-is
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        match self {
            Decoded::Valid(value) => Decoded::Valid(f(value)),
            Decoded::Missing => Decoded::Missing,
            Decoded::Invalid { reason } => Decoded::Invalid { reason },
        }
    }
}

/// Parse raw stored text as JSON
pub fn decode_json_text(raw: Option<&str>) -> Decoded<Value> {
    match raw {
        None => Decoded::Missing,
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Null) => Decoded::Missing,
            Ok(value) => Decoded::Valid(value),
            Err(e) => Decoded::Invalid {
                reason: e.to_string(),
            },
        },
    }
}

/// Accept a list-shaped slice only if it is a JSON array
pub fn decode_list(raw: Option<&Value>) -> Decoded<Vec<Value>> {
    match raw {
        None | Some(Value::Null) => Decoded::Missing,
        Some(Value::Array(items)) => Decoded::Valid(items.clone()),
        Some(other) => Decoded::Invalid {
            reason: format!("expected an array, found {}", json_kind(other)),
        },
    }
}

/// Accept a map-shaped slice only if it is a JSON object
///
/// Entries whose value does not decode as `T` are dropped.
pub fn decode_map<T: DeserializeOwned>(raw: Option<&Value>) -> Decoded<BTreeMap<String, T>> {
    match raw {
        None | Some(Value::Null) => Decoded::Missing,
        Some(Value::Object(entries)) => {
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                match serde_json::from_value::<T>(value.clone()) {
                    Ok(decoded) => {
                        map.insert(key.clone(), decoded);
                    }
                    Err(e) => {
                        debug!(field = %key, error = %e, "Skipping malformed map entry");
                    }
                }
            }
            Decoded::Valid(map)
        }
        Some(other) => Decoded::Invalid {
            reason: format!("expected an object, found {}", json_kind(other)),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ==================== Field Settings ====================

/// The three per-field setting kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKind {
    /// Field shown/hidden
    Enabled,
    /// Numeric format code
    Format,
    /// Info tip text
    Tip,
}

/// Per-field enabled flags, numeric formats, and info tips
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    pub enabled: BTreeMap<String, bool>,
    pub formats: BTreeMap<String, String>,
    pub tips: BTreeMap<String, String>,
}

impl FieldSettings {
    /// Decode from an optional JSON object, defaulting each map independently
    pub fn from_value(raw: Option<&Value>) -> Self {
        match raw {
            Some(Value::Object(obj)) => Self {
                enabled: decode_map(obj.get("enabled")).into_value(),
                formats: decode_map(obj.get("formats")).into_value(),
                tips: decode_map(obj.get("tips")).into_value(),
            },
            _ => Self::default(),
        }
    }

    pub fn enabled(&self, field: &str) -> Option<bool> {
        self.enabled.get(field).copied()
    }

    pub fn format(&self, field: &str) -> Option<&str> {
        self.formats.get(field).map(String::as_str)
    }

    pub fn tip(&self, field: &str) -> Option<&str> {
        self.tips.get(field).map(String::as_str)
    }

    /// Whether an explicit value of `kind` is stored for `field`
    pub fn has(&self, field: &str, kind: SettingKind) -> bool {
        match kind {
            SettingKind::Enabled => self.enabled.contains_key(field),
            SettingKind::Format => self.formats.contains_key(field),
            SettingKind::Tip => self.tips.contains_key(field),
        }
    }

    /// Remove the stored value of `kind` for `field`, returning whether one existed
    pub fn clear(&mut self, field: &str, kind: SettingKind) -> bool {
        match kind {
            SettingKind::Enabled => self.enabled.remove(field).is_some(),
            SettingKind::Format => self.formats.remove(field).is_some(),
            SettingKind::Tip => self.tips.remove(field).is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.formats.is_empty() && self.tips.is_empty()
    }
}

// ==================== Named Configuration ====================

/// A saved scenario; its name is the key it is stored under
///
/// The same shape doubles as the snapshot of the live settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamedConfiguration {
    pub filters: Vec<Value>,
    pub field_settings: FieldSettings,
    pub rules: Vec<Value>,
    pub post_transform_field_settings: FieldSettings,
}

impl NamedConfiguration {
    /// Decode a stored scenario, defaulting every missing or malformed slice
    ///
    /// Only a non-object value is reported as invalid.
    pub fn from_value(raw: &Value) -> Decoded<Self> {
        let Value::Object(obj) = raw else {
            return Decoded::Invalid {
                reason: format!("expected an object, found {}", json_kind(raw)),
            };
        };

        Decoded::Valid(Self {
            filters: decode_list(obj.get("filters")).into_value(),
            field_settings: FieldSettings::from_value(obj.get("fieldSettings")),
            rules: decode_list(obj.get("rules")).into_value(),
            post_transform_field_settings: FieldSettings::from_value(
                obj.get("postTransformFieldSettings"),
            ),
        })
    }

    /// Encode as the JSON object stored in the scenario map
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Check an imported document for the required top-level keys
///
/// Deeper structure is not validated; imported data is trusted as-is.
pub fn validate_import(document: &Value) -> Result<()> {
    let Value::Object(obj) = document else {
        return Err(Error::Invalid {
            message: format!(
                "Imported scenario must be a JSON object, found {}",
                json_kind(document)
            ),
        });
    };

    let missing: Vec<&'static str> = REQUIRED_IMPORT_KEYS
        .into_iter()
        .filter(|key| !obj.contains_key(*key))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingImportKeys { missing })
    }
}

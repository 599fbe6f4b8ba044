//! Application Settings
//!
//! `finalyze.toml` in the per-user config directory.

use crate::constants::{DEFAULT_API_BASE_URL, JOB_POLL_INTERVAL_MS, REQUEST_TIMEOUT_SECS};
use crate::error::Result;
use crate::helpers::{get_or_create_config_dir, get_or_create_data_dir};
use crate::storage::STORAGE_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const SETTINGS_FILE: &str = "finalyze.toml";

/// User settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSettings {
    /// Storage file override; the data directory is used when unset
    pub storage_file: Option<PathBuf>,
    /// Base URL of the job API
    pub api_base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_file: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_ms: JOB_POLL_INTERVAL_MS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppSettings {
    /// Path of the settings file in the user config directory
    pub fn default_path() -> Result<PathBuf> {
        Ok(get_or_create_config_dir()?.join(SETTINGS_FILE))
    }

    /// Load from the user config directory
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`; a missing or empty file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Settings file");

        if !path.exists() {
            return Ok(Self::default());
        }

        let value = std::fs::read_to_string(path)?;
        if value.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(toml::from_str(&value)?)
    }

    /// Save to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Storage file to open: the override, or the data directory default
    pub fn storage_path(&self) -> Result<PathBuf> {
        match &self.storage_file {
            Some(path) => Ok(path.clone()),
            None => Ok(get_or_create_data_dir()?.join(STORAGE_FILE_NAME)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

//! File System Utilities
//!
//! Configuration and data directory management.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "finalyze", "finalyze").ok_or_else(|| Error::Invalid {
        message: "Could not determine project directories".to_string(),
    })
}

/// Get or create the application's configuration directory
///
/// Platform-specific locations:
/// - **Linux**: `~/.config/finalyze/` or `$XDG_CONFIG_HOME/finalyze/`
/// - **macOS**: `~/Library/Application Support/com.finalyze.finalyze/`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\finalyze\finalyze\config\`
pub fn get_or_create_config_dir() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let config_dir = dirs.config_dir();

    if !config_dir.exists() {
        fs::create_dir_all(config_dir)?;
    }

    Ok(config_dir.to_path_buf())
}

/// Get or create the data directory holding the scenario storage file
///
/// Platform-specific locations:
/// - **Linux**: `~/.local/share/finalyze/`
/// - **macOS**: `~/Library/Application Support/com.finalyze.finalyze/`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\finalyze\finalyze\data\`
pub fn get_or_create_data_dir() -> Result<PathBuf> {
    let dirs = project_dirs()?;
    let data_dir = dirs.data_dir();

    if !data_dir.exists() {
        fs::create_dir_all(data_dir)?;
    }

    Ok(data_dir.to_path_buf())
}

/// Lowercased extension of a file name, if any
pub fn file_extension(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

//! Key-Value Storage
//!
//! Browser-style key-value persistence. Every value is a string; callers
//! own the encoding (JSON for structured slices, plain text for markers).
//!
//! ```text
//! ConfigurationRepository ─┐
//!                          ├──► Arc<dyn KeyValueStore> ──► MemoryStore | FileStore
//! ActiveSettingsBridge ────┘
//! ```

mod file;
mod memory;

pub use file::*;
pub use memory::*;

use crate::error::Result;
use std::sync::Arc;

/// Synchronous string key-value storage
///
/// Reads never fail: a missing key and an unreadable backend both yield `None`.
/// Writes report failures (quota, IO) to the caller.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` if present
    fn remove_item(&self, key: &str) -> Result<()>;

    /// All keys currently stored, in no particular order
    fn keys(&self) -> Vec<String>;
}

/// Storage handle shared between the repository and the live-settings bridge
pub type SharedStore = Arc<dyn KeyValueStore>;

//! Error types for Finalyze
//!
//! Centralized error handling using snafu for ergonomic error definitions.

use snafu::Snafu;

/// Main error type for the library
#[derive(Debug, Snafu)]
pub enum Error {
    /// Invalid input or configuration
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// Scenario name was empty after trimming
    #[snafu(display("Scenario name must not be empty"))]
    InvalidName,

    /// No scenario with the given name exists
    #[snafu(display("Scenario not found: {name}"))]
    NotFound { name: String },

    /// The active scenario cannot be deleted
    #[snafu(display("Cannot delete the active scenario '{name}'"))]
    DeleteActive { name: String },

    /// Imported scenario file lacks required top-level keys
    #[snafu(display("Imported scenario is missing required keys: {}", missing.join(", ")))]
    MissingImportKeys { missing: Vec<&'static str> },

    /// File extension not accepted for this upload
    #[snafu(display("Unsupported file '{file_name}', expected a {expected} file"))]
    UnsupportedFile {
        file_name: String,
        expected: &'static str,
    },

    /// Key-value storage write failed (quota exceeded, IO, ...)
    #[snafu(display("Storage write failed for '{key}': {message}"))]
    Storage { key: String, message: String },

    /// IO error (file operations)
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// JSON serialization/deserialization error
    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },

    /// TOML serialization error
    #[snafu(display("TOML serialize error: {source}"))]
    TomlSe { source: toml::ser::Error },

    /// HTTP request to a job endpoint failed
    #[snafu(display("HTTP error: {source}"))]
    Http { source: reqwest::Error },

    /// Job endpoint answered with an unexpected payload
    #[snafu(display("Job error: {message}"))]
    Job { message: String },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(source: toml::ser::Error) -> Self {
        Error::TomlSe { source }
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        Error::Http { source }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(source: tokio::task::JoinError) -> Self {
        Error::Job {
            message: format!("background task ended abnormally: {source}"),
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;

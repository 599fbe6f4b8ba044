//! AppEvent - Application Event Enum
//!
//! Everything the controllers and background tasks tell the UI layer.

use chrono::{DateTime, Local};

use crate::domain::inheritance::ResolvedField;
use crate::domain::job::{JobKind, JobStatus};
use crate::domain::scenario::NamedConfiguration;

/// Severity of a transient status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warn,
    Error,
}

impl StatusLevel {
    pub fn label(&self) -> &'static str {
        match self {
            StatusLevel::Info => "INFO",
            StatusLevel::Success => "OK",
            StatusLevel::Warn => "WARN",
            StatusLevel::Error => "ERROR",
        }
    }
}

/// Application events for controller -> UI communication
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Transient message for the status area
    Status {
        level: StatusLevel,
        message: String,
        timestamp: DateTime<Local>,
    },

    /// Saved scenario list or active scenario changed
    ScenariosChanged {
        names: Vec<String>,
        active: Option<String>,
    },

    /// A scenario was pushed into the live settings; listeners reload from it
    ScenarioActivated {
        name: String,
        settings: NamedConfiguration,
    },

    /// Modified flag flipped
    ModifiedChanged { modified: bool },

    /// A post-transform table row must be re-rendered
    PostTransformRowChanged { row: ResolvedField },

    /// Accepted status of a mass-fetch job
    JobStatus { kind: JobKind, status: JobStatus },

    /// Progress line received from a job's event stream
    JobProgress { kind: JobKind, message: String },
}

impl AppEvent {
    /// Create a status event with current timestamp
    pub fn status(level: StatusLevel, message: impl Into<String>) -> Self {
        Self::Status {
            level,
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::status(StatusLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::status(StatusLevel::Success, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::status(StatusLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::status(StatusLevel::Error, message)
    }

    /// Level and text, if this is a status message
    pub fn as_status(&self) -> Option<(StatusLevel, &str)> {
        match self {
            AppEvent::Status { level, message, .. } => Some((*level, message.as_str())),
            _ => None,
        }
    }
}

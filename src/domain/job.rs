//! Job - Mass-Fetch Ingestion Jobs
//!
//! Status payloads of the background ingestion jobs (Yahoo, Finviz, EDGAR).
//! Every run is stamped with a trigger timestamp; a status belongs to the run
//! whose timestamp it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External data source of a mass-fetch job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Yahoo,
    Finviz,
    Edgar,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::Yahoo, JobKind::Finviz, JobKind::Edgar];

    /// Fixed backend job identifier
    pub fn job_id(self) -> &'static str {
        match self {
            JobKind::Yahoo => "yahoo_mass_fetch",
            JobKind::Finviz => "finviz_mass_fetch",
            JobKind::Edgar => "edgar_mass_fetch",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobKind::Yahoo => "Yahoo",
            JobKind::Finviz => "Finviz",
            JobKind::Edgar => "EDGAR",
        }
    }

    /// Whether the job takes an uploaded ticker list
    pub fn accepts_tickers(self) -> bool {
        matches!(self, JobKind::Yahoo | JobKind::Finviz)
    }
}

impl std::str::FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(JobKind::Yahoo),
            "finviz" => Ok(JobKind::Finviz),
            "edgar" => Ok(JobKind::Edgar),
            other => Err(format!("unknown job kind '{other}'")),
        }
    }
}

/// Lifecycle state reported by the job backend
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    #[default]
    Idle,
    Queued,
    Running,
    Completed,
    Failed,
    PartialFailure,
    /// Any state string this client does not know
    Unknown(String),
}

impl JobState {
    /// Terminal states stop polling
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::PartialFailure
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Queued | JobState::Running)
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobState::Idle => "idle",
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::PartialFailure => "partial_failure",
            JobState::Unknown(raw) => raw,
        }
    }
}

impl From<String> for JobState {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "idle" | "not_started" => JobState::Idle,
            "queued" | "pending" => JobState::Queued,
            "running" | "in_progress" => JobState::Running,
            "completed" | "success" => JobState::Completed,
            "failed" | "error" => JobState::Failed,
            "partial_failure" | "completed_with_errors" => JobState::PartialFailure,
            _ => JobState::Unknown(raw),
        }
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}

/// One job status snapshot from the detail endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: JobState,
    /// Timestamp of the run this status belongs to
    #[serde(default)]
    pub trigger_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    /// Completion percentage, when the backend reports totals
    pub fn percent(&self) -> Option<f64> {
        match (self.processed, self.total) {
            (Some(done), Some(total)) if total > 0 => {
                Some((done as f64 / total as f64 * 100.0).min(100.0))
            }
            _ => None,
        }
    }

    /// One-line progress text for the job panel
    pub fn progress_text(&self) -> String {
        let mut text = self.status.as_str().replace('_', " ");
        if let (Some(done), Some(total)) = (self.processed, self.total) {
            text.push_str(&format!(" ({done}/{total})"));
        }
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            text.push_str(": ");
            text.push_str(message);
        }
        text
    }
}

/// Acknowledgement of a job trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerReceipt {
    pub job_id: String,
    pub trigger_timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_status_payload() {
        let status: JobStatus = serde_json::from_value(json!({
            "job_id": "yahoo_mass_fetch",
            "status": "completed_with_errors",
            "trigger_timestamp": "2026-10-18T09:30:00Z",
            "processed": 40,
            "total": 50,
            "errors": ["ZZZZ: not found"]
        }))
        .expect("decode");

        assert_eq!(status.status, JobState::PartialFailure);
        assert!(status.status.is_terminal());
        assert_eq!(status.percent(), Some(80.0));
        assert_eq!(status.errors.len(), 1);
    }

    #[test]
    fn unknown_states_round_trip_raw_text() {
        let state = JobState::from("throttled".to_string());
        assert_eq!(state, JobState::Unknown("throttled".into()));
        assert!(!state.is_terminal());
        assert_eq!(String::from(state), "throttled");
    }

    #[test]
    fn progress_text_includes_counts_and_message() {
        let status = JobStatus {
            status: JobState::Running,
            processed: Some(3),
            total: Some(10),
            message: Some("fetching MSFT".into()),
            ..Default::default()
        };
        assert_eq!(status.progress_text(), "running (3/10): fetching MSFT");
        assert_eq!(JobStatus::default().percent(), None);
    }

    #[test]
    fn job_kind_ids() {
        assert_eq!(JobKind::Edgar.job_id(), "edgar_mass_fetch");
        assert_eq!("FINVIZ".parse::<JobKind>(), Ok(JobKind::Finviz));
        assert!("bloomberg".parse::<JobKind>().is_err());
    }
}

//! MassFetchState - Per-Job Panel State
//!
//! Latest accepted status, running flag, pending ticker upload, and a ring
//! buffer of progress lines for each mass-fetch job.

use crate::constants::JOB_PROGRESS_LOG_CAPACITY;
use crate::domain::job::{JobKind, JobStatus};
use crate::domain::ticker::TickerUpload;
use crate::error::{Error, Result};
use crate::eventing::AppEvent;
use chrono::{DateTime, Local};
use std::collections::{HashMap, VecDeque};

/// One progress line
#[derive(Debug, Clone)]
pub struct ProgressEntry {
    pub id: u64,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// State of one job's panel
#[derive(Debug, Clone)]
pub struct JobPanel {
    kind: JobKind,
    status: Option<JobStatus>,
    running: bool,
    upload: Option<TickerUpload>,
    last_error: Option<String>,
    progress: VecDeque<ProgressEntry>,
    capacity: usize,
    next_id: u64,
}

impl JobPanel {
    fn new(kind: JobKind, capacity: usize) -> Self {
        Self {
            kind,
            status: None,
            running: false,
            upload: None,
            last_error: None,
            progress: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_id: 1,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn status(&self) -> Option<&JobStatus> {
        self.status.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn upload(&self) -> Option<&TickerUpload> {
        self.upload.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Progress lines, oldest first
    pub fn progress(&self) -> impl Iterator<Item = &ProgressEntry> {
        self.progress.iter()
    }

    pub fn progress_len(&self) -> usize {
        self.progress.len()
    }

    fn push_progress(&mut self, message: String) {
        if self.capacity == 0 {
            return;
        }
        if self.progress.len() >= self.capacity {
            self.progress.pop_front();
        }
        self.progress.push_back(ProgressEntry {
            id: self.next_id,
            message,
            timestamp: Local::now(),
        });
        self.next_id += 1;
    }

    fn apply_status(&mut self, status: JobStatus) {
        self.running = !status.status.is_terminal();
        if status.status.is_terminal() && !status.errors.is_empty() {
            self.last_error = Some(status.errors.join("; "));
        }
        self.status = Some(status);
    }
}

/// State for all mass-fetch jobs
#[derive(Debug, Clone)]
pub struct MassFetchState {
    panels: HashMap<JobKind, JobPanel>,
}

impl Default for MassFetchState {
    fn default() -> Self {
        Self::new(JOB_PROGRESS_LOG_CAPACITY)
    }
}

impl MassFetchState {
    /// Create panels for every job kind, each keeping `capacity` progress lines
    pub fn new(capacity: usize) -> Self {
        Self {
            panels: JobKind::ALL
                .iter()
                .map(|kind| (*kind, JobPanel::new(*kind, capacity)))
                .collect(),
        }
    }

    pub fn panel(&self, kind: JobKind) -> Option<&JobPanel> {
        self.panels.get(&kind)
    }

    fn panel_mut(&mut self, kind: JobKind) -> &mut JobPanel {
        self.panels
            .entry(kind)
            .or_insert_with(|| JobPanel::new(kind, JOB_PROGRESS_LOG_CAPACITY))
    }

    pub fn is_running(&self, kind: JobKind) -> bool {
        self.panel(kind).is_some_and(JobPanel::is_running)
    }

    /// Attach an uploaded ticker list to a job that takes one
    pub fn set_upload(&mut self, kind: JobKind, upload: TickerUpload) -> Result<()> {
        if !kind.accepts_tickers() {
            return Err(Error::Invalid {
                message: format!("{} fetch does not take a ticker list", kind.label()),
            });
        }
        self.panel_mut(kind).upload = Some(upload);
        Ok(())
    }

    pub fn clear_upload(&mut self, kind: JobKind) {
        self.panel_mut(kind).upload = None;
    }

    /// Tickers to send with the next trigger
    pub fn pending_tickers(&self, kind: JobKind) -> Vec<String> {
        self.panel(kind)
            .and_then(JobPanel::upload)
            .map(|upload| upload.tickers.clone())
            .unwrap_or_default()
    }

    /// A new run was triggered; previous progress belongs to the old run
    pub fn on_triggered(&mut self, kind: JobKind) {
        let panel = self.panel_mut(kind);
        panel.running = true;
        panel.status = None;
        panel.last_error = None;
        panel.progress.clear();
    }

    pub fn on_trigger_failed(&mut self, kind: JobKind, message: impl Into<String>) {
        let panel = self.panel_mut(kind);
        panel.running = false;
        panel.last_error = Some(message.into());
    }

    /// Apply a job event; returns whether it changed any panel
    pub fn apply(&mut self, event: &AppEvent) -> bool {
        match event {
            AppEvent::JobStatus { kind, status } => {
                self.panel_mut(*kind).apply_status(status.clone());
                true
            }
            AppEvent::JobProgress { kind, message } => {
                self.panel_mut(*kind).push_progress(message.clone());
                true
            }
            _ => false,
        }
    }
}

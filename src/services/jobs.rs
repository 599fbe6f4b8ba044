//! Mass-Fetch Jobs
//!
//! Triggers ingestion jobs and polls their status until a terminal state.
//!
//! ```text
//! trigger ──► TriggerReceipt(ts) ──► StalenessFilter(ts)
//!                                          │
//! interval tick ──► fetch_status ──► accept? ──► AppEvent::JobStatus
//!                                          └──► terminal ──► stop
//! ```
//!
//! Only statuses stamped with the latest known trigger timestamp are shown;
//! a late response from an earlier run is dropped, and a newer run (triggered
//! elsewhere) takes over.

use crate::domain::job::{JobKind, JobStatus, TriggerReceipt};
use crate::error::{Error, Result};
use crate::eventing::AppEvent;
use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// ==================== Backend ====================

/// Job API consumed by the poller
pub trait JobBackend: Send + Sync + 'static {
    /// Start a run; the receipt carries its trigger timestamp
    fn trigger(&self, job_id: &str, tickers: &[String]) -> impl Future<Output = Result<TriggerReceipt>> + Send;

    /// Current status of the job's latest known run
    fn fetch_status(&self, job_id: &str) -> impl Future<Output = Result<JobStatus>> + Send;
}

#[derive(Debug, Serialize)]
struct TriggerRequest<'a> {
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tickers: &'a [String],
}

/// reqwest-backed job API client
#[derive(Debug, Clone)]
pub struct HttpJobBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpJobBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::Invalid {
                message: "job API base URL is empty".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("finalyze/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn trigger_url(&self, job_id: &str) -> String {
        format!("{}/api/jobs/{job_id}/trigger", self.base_url)
    }

    pub fn status_url(&self, job_id: &str) -> String {
        format!("{}/api/jobs/{job_id}", self.base_url)
    }

    pub fn stream_url(&self, job_id: &str) -> String {
        format!("{}/api/jobs/{job_id}/stream", self.base_url)
    }
}

impl JobBackend for HttpJobBackend {
    async fn trigger(&self, job_id: &str, tickers: &[String]) -> Result<TriggerReceipt> {
        let url = self.trigger_url(job_id);
        debug!(%url, tickers = tickers.len(), "Triggering job");

        let response = self
            .http
            .post(&url)
            .json(&TriggerRequest { tickers })
            .send()
            .await?;
        decode_json_response(&url, response).await
    }

    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus> {
        let url = self.status_url(job_id);
        let response = self.http.get(&url).send().await?;
        decode_json_response(&url, response).await
    }
}

async fn decode_json_response<T>(url: &str, response: reqwest::Response) -> Result<T>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes);
        let body = body.trim();
        return Err(Error::Job {
            message: format!(
                "{url} returned {status}: {}",
                if body.is_empty() { "<empty>" } else { body }
            ),
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}

// ==================== Staleness ====================

/// Last-trigger-wins filter over status responses
#[derive(Debug, Clone, Default)]
pub struct StalenessFilter {
    current: Option<DateTime<Utc>>,
}

impl StalenessFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trigger(trigger_timestamp: DateTime<Utc>) -> Self {
        Self {
            current: Some(trigger_timestamp),
        }
    }

    /// A new run was triggered; older statuses become stale
    pub fn record_trigger(&mut self, trigger_timestamp: DateTime<Utc>) {
        self.current = Some(self.current.map_or(trigger_timestamp, |c| c.max(trigger_timestamp)));
    }

    pub fn current(&self) -> Option<DateTime<Utc>> {
        self.current
    }

    /// Whether `status` belongs to the latest run
    ///
    /// The tracked timestamp only moves forward: an older run is rejected and
    /// a newer one replaces the tracked run. With no run known yet,
    /// untimestamped statuses pass through.
    pub fn accept(&mut self, status: &JobStatus) -> bool {
        match (self.current, status.trigger_timestamp) {
            (Some(current), Some(ts)) if ts < current => false,
            (Some(_), None) => false,
            (_, Some(ts)) => {
                self.current = Some(ts);
                true
            }
            (None, None) => true,
        }
    }
}

// ==================== Poller ====================

/// Poll `kind` every `interval` until a terminal status is accepted
///
/// Fetch errors are logged and retried on the next tick. Returns `None` when
/// the event receiver went away first.
pub async fn poll_until_terminal<B: JobBackend>(
    backend: &B,
    kind: JobKind,
    filter: &mut StalenessFilter,
    interval: Duration,
    events: &Sender<AppEvent>,
) -> Option<JobStatus> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let status = match backend.fetch_status(kind.job_id()).await {
            Ok(status) => status,
            Err(e) => {
                warn!(job = kind.job_id(), error = %e, "Job status fetch failed");
                continue;
            }
        };

        if !filter.accept(&status) {
            debug!(
                job = kind.job_id(),
                status_ts = ?status.trigger_timestamp,
                current_ts = ?filter.current(),
                "Ignoring stale job status"
            );
            continue;
        }

        let terminal = status.status.is_terminal();
        if events
            .send(AppEvent::JobStatus {
                kind,
                status: status.clone(),
            })
            .is_err()
        {
            debug!(job = kind.job_id(), "Event receiver dropped; stopping poller");
            return None;
        }

        if terminal {
            info!(job = kind.job_id(), state = status.status.as_str(), "Job finished");
            return Some(status);
        }
    }
}

/// Handle of a running poller; dropping it cancels polling
#[derive(Debug)]
pub struct PollHandle {
    kind: JobKind,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop polling now
    pub fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(job = self.kind.job_id(), "Poller aborted");
        }
    }

    /// Wait for the poller to stop on its own
    pub async fn join(mut self) -> Result<()> {
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Ok(()),
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Spawns status pollers onto tokio
pub struct JobPoller;

impl JobPoller {
    /// Start polling `kind`; statuses not matching `filter` are dropped
    ///
    /// Uses the caller's tokio runtime when there is one, the shared runtime
    /// otherwise.
    pub fn spawn<B: JobBackend>(
        backend: Arc<B>,
        kind: JobKind,
        mut filter: StalenessFilter,
        interval: Duration,
        events: Sender<AppEvent>,
    ) -> Result<PollHandle> {
        let future = async move {
            poll_until_terminal(backend.as_ref(), kind, &mut filter, interval, &events).await;
        };

        let task = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.spawn(future),
            Err(_) => super::runtime::spawn_named(kind.job_id(), future)?,
        };

        Ok(PollHandle {
            kind,
            task: Some(task),
        })
    }

    /// Trigger a run and poll it
    pub async fn trigger_and_poll<B: JobBackend>(
        backend: Arc<B>,
        kind: JobKind,
        tickers: &[String],
        interval: Duration,
        events: Sender<AppEvent>,
    ) -> Result<PollHandle> {
        let tickers: &[String] = if kind.accepts_tickers() {
            tickers
        } else {
            if !tickers.is_empty() {
                warn!(job = kind.job_id(), "Job does not take a ticker list; ignoring upload");
            }
            &[]
        };

        let receipt = backend.trigger(kind.job_id(), tickers).await?;
        info!(
            job = kind.job_id(),
            trigger_ts = %receipt.trigger_timestamp,
            tickers = tickers.len(),
            "Job triggered"
        );
        let _ = events.send(AppEvent::info(format!("{} fetch started", kind.label())));

        Self::spawn(
            backend,
            kind,
            StalenessFilter::with_trigger(receipt.trigger_timestamp),
            interval,
            events,
        )
    }
}

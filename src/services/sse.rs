//! Server-Sent Events
//!
//! Incremental decoder for `text/event-stream` bodies and the reader that
//! forwards a job's progress stream as `AppEvent::JobProgress`.

use crate::domain::job::JobKind;
use crate::error::{Error, Result};
use crate::eventing::AppEvent;
use crossbeam_channel::Sender;
use futures::StreamExt;
use tracing::{debug, warn};

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field, `"message"` when absent
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

/// Decoder fed with arbitrary body chunks
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    last_event_id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last `id:` seen, for resuming a dropped stream
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Feed a chunk; returns the events completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n' || *b == b'\r') {
            // A lone trailing CR may be the first half of CRLF
            if self.buffer[end] == b'\r' && end + 1 == self.buffer.len() {
                break;
            }
            let skip = if self.buffer[end] == b'\r' && self.buffer.get(end + 1) == Some(&b'\n') {
                2
            } else {
                1
            };

            let line: Vec<u8> = self.buffer.drain(..end + skip).take(end).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Flush an event left open at end of stream
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            let trimmed = line.trim_end_matches('\r');
            if let Some(event) = self.process_line(trimmed) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            // "retry" and unknown fields
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let id = self.id.take();
        if id.is_some() {
            self.last_event_id = id.clone();
        }

        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: std::mem::take(&mut self.data).join("\n"),
            id,
        })
    }
}

/// Forward a job's event stream as progress events until it closes
///
/// Returns the number of events forwarded.
pub async fn stream_job_events(
    client: &reqwest::Client,
    url: &str,
    kind: JobKind,
    sink: &Sender<AppEvent>,
) -> Result<usize> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Job {
            message: format!("{url} returned {status}"),
        });
    }

    let mut decoder = SseDecoder::new();
    let mut stream = response.bytes_stream();
    let mut forwarded = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(job = kind.job_id(), error = %e, "Job event stream interrupted");
                return Err(e.into());
            }
        };

        for event in decoder.push(&chunk) {
            if !forward(kind, event, sink) {
                return Ok(forwarded);
            }
            forwarded += 1;
        }
    }

    if let Some(event) = decoder.finish() {
        if forward(kind, event, sink) {
            forwarded += 1;
        }
    }

    debug!(job = kind.job_id(), forwarded, "Job event stream closed");
    Ok(forwarded)
}

fn forward(kind: JobKind, event: SseEvent, sink: &Sender<AppEvent>) -> bool {
    let message = if event.event == "message" {
        event.data
    } else {
        format!("[{}] {}", event.event, event.data)
    };
    sink.send(AppEvent::JobProgress { kind, message }).is_ok()
}

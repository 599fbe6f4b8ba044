//! Service Layer
//!
//! Storage-backed scenario persistence and the mass-fetch job client.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ScenarioController                       │
//! │  ┌─────────────────────────┐  ┌───────────────────────────┐  │
//! │  │ ConfigurationRepository │  │   ActiveSettingsBridge    │  │
//! │  │   (saved scenarios)     │  │ (live keys, active, flag) │  │
//! │  └─────────────────────────┘  └───────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!                 │ KeyValueStore
//!                 ▼
//!        MemoryStore / FileStore
//!
//!   JobPoller ──► JobBackend (HTTP) ──► AppEvent::JobStatus
//!   stream_job_events (SSE)          ──► AppEvent::JobProgress
//! ```

mod bridge;
mod jobs;
mod repository;
mod runtime;
mod sse;

pub use bridge::*;
pub use jobs::*;
pub use repository::*;
pub use runtime::*;
pub use sse::*;

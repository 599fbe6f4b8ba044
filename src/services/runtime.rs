//! Tokio Runtime Bridge
//!
//! The scenario controller is synchronous; job polling and the SSE reader
//! need tokio. This module owns one shared runtime for the synchronous side
//! to spawn onto or block on.
//!
//! ```text
//! sync caller ──► spawn_named("poll:yahoo", fut) ──► tokio::Runtime ──► JoinHandle
//!             └─► block_on(fut)                  ──► result
//! ```

use std::future::Future;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::error::Result;

static TOKIO_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Get or initialize the global tokio runtime
fn get_runtime() -> Result<&'static Runtime> {
    if let Some(runtime) = TOKIO_RUNTIME.get() {
        return Ok(runtime);
    }

    let runtime = Builder::new_multi_thread()
        .thread_name("finalyze-worker")
        .enable_all()
        .build()?;

    // A concurrent initializer may win; its runtime is used and ours dropped.
    Ok(TOKIO_RUNTIME.get_or_init(|| runtime))
}

/// Spawn a named background task and keep its handle for cancellation
pub fn spawn_named<F>(name: &'static str, future: F) -> Result<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::debug!(task = name, "Spawning tokio task");
    let handle = get_runtime()?.spawn(async move {
        future.await;
        tracing::debug!(task = name, "Tokio task completed");
    });
    Ok(handle)
}

/// Block the current thread on a future
///
/// Must not be called from inside the runtime's own workers.
pub fn block_on<F, T>(future: F) -> Result<T>
where
    F: Future<Output = T>,
{
    Ok(get_runtime()?.block_on(future))
}

//! Async runtime bridge for Horizon Tags.
//!
//! Widgets spawn their deferred work (debounce timers, pending veto checks,
//! suggestion fetches) through [`spawn`]. When the caller is already inside a
//! Tokio runtime the task lands there; otherwise it goes to a lazily created
//! fallback runtime shared by every widget in the process.
//!
//! # Example
//!
//! ```no_run
//! use horizon_tags_core::runtime;
//!
//! let handle = runtime::spawn(async { 21 * 2 }).expect("runtime available");
//! ```

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

const FALLBACK_THREAD_NAME: &str = "horizon-tags";
const FALLBACK_WORKERS: usize = 2;

static FALLBACK: OnceLock<Runtime> = OnceLock::new();

fn fallback() -> Result<&'static Runtime, RuntimeError> {
    if let Some(runtime) = FALLBACK.get() {
        return Ok(runtime);
    }
    let runtime = Builder::new_multi_thread()
        .worker_threads(FALLBACK_WORKERS)
        .thread_name(FALLBACK_THREAD_NAME)
        .enable_time()
        .build()
        .map_err(|e| RuntimeError::CreationFailed(e.to_string()))?;
    tracing::debug!(target: "horizon_tags_core::runtime", "started fallback runtime");
    // A concurrent caller may have won; its runtime is used and ours dropped.
    let _ = FALLBACK.set(runtime);
    FALLBACK
        .get()
        .ok_or_else(|| RuntimeError::CreationFailed("fallback runtime unavailable".into()))
}

/// Spawn a task on the ambient runtime, or the fallback runtime when there is none.
pub fn spawn<F>(future: F) -> Result<JoinHandle<F::Output>, RuntimeError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => Ok(handle.spawn(future)),
        Err(_) => {
            tracing::trace!(target: "horizon_tags_core::runtime", "no ambient runtime, using fallback");
            Ok(fallback()?.spawn(future))
        }
    }
}

/// Errors from the runtime bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The fallback runtime could not be built.
    CreationFailed(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreationFailed(msg) => write!(f, "Failed to create async runtime: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}

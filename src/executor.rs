//! Explicitly owned handle to the blocking-thread executor used by the
//! threaded mapping engine.
//!
//! Each engine instance addresses its worker pool through an injected
//! `ExecutorHandle` rather than a process-wide singleton, so two pipelines
//! can be pinned to different runtimes and a dropped pipeline releases
//! nothing it does not own. In-flight tasks detach on drop and run to
//! completion with their results discarded.

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Handle to the executor that runs blocking transformations.
///
/// The default handle resolves the ambient tokio runtime at spawn time;
/// [`ExecutorHandle::from_runtime`] pins every task the engine submits to a
/// specific runtime's blocking pool instead.
#[derive(Debug, Clone, Default)]
pub struct ExecutorHandle {
    runtime: Option<Handle>,
}

impl ExecutorHandle {
    /// Capture the current runtime's handle.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, same as
    /// [`Handle::current`].
    pub fn current() -> Self {
        Self {
            runtime: Some(Handle::current()),
        }
    }

    /// Pin all submitted work to the given runtime.
    pub fn from_runtime(handle: Handle) -> Self {
        Self {
            runtime: Some(handle),
        }
    }

    pub(crate) fn spawn_blocking<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        match &self.runtime {
            Some(handle) => handle.spawn_blocking(f),
            None => tokio::task::spawn_blocking(f),
        }
    }
}

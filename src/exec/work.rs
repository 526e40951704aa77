// src/exec/work.rs

//! The caller-supplied body of a task.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

/// Future produced by invoking a [`TaskWork`].
pub type WorkFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

/// An opaque unit of work.
///
/// The scheduler invokes it at most once, handing it the task's cancellation
/// signal. Returning `Err` marks the task `failed`; the signal firing means
/// the task was timed out and the body should wind down.
pub struct TaskWork {
    body: Box<dyn FnOnce(CancellationToken) -> WorkFuture + Send>,
}

impl TaskWork {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            body: Box::new(move |signal| Box::pin(f(signal))),
        }
    }

    /// Consume the work and start its future.
    pub fn invoke(self, signal: CancellationToken) -> WorkFuture {
        (self.body)(signal)
    }
}

impl fmt::Debug for TaskWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWork").finish_non_exhaustive()
    }
}

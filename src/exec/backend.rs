// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning bodies
//! itself. This makes it easy to swap in a fake executor in tests.
//!
//! - `TokioExecutor` is the default implementation used by `Scheduler`. It
//!   spawns one Tokio task per dispatched work item via
//!   [`run_task`](super::task_runner::run_task).
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were dispatched and directly emits `TaskExited` events.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::debug;

use crate::dag::ScheduledTask;
use crate::engine::SchedulerEvent;
use crate::errors::Result;

use super::task_runner::run_task;

/// Trait abstracting how dispatched tasks are executed.
///
/// Every dispatched task must eventually produce exactly one
/// `SchedulerEvent::TaskExited`, otherwise its concurrency slot is never
/// released.
pub trait ExecutorBackend: Send {
    /// Start the given tasks.
    ///
    /// Implementations must not wait for the bodies to finish.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executor backend used in production: each task body runs in its own
/// Tokio task.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    events: mpsc::UnboundedSender<SchedulerEvent>,
}

impl TokioExecutor {
    /// Create an executor reporting to the given event sender.
    pub fn new(events: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        Self { events }
    }
}

impl ExecutorBackend for TokioExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let events = self.events.clone();

        Box::pin(async move {
            for task in tasks {
                debug!(task = %task.id, "spawning task body");
                tokio::spawn(run_task(task, events.clone()));
            }
            Ok(())
        })
    }
}

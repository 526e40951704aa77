// src/engine/mod.rs

//! Scheduling engine for taskdag.
//!
//! This module ties together:
//! - the task registry (admission control and state transitions)
//! - the run loop that reacts to:
//!   - task bodies exiting
//!   - task timeouts firing
//!   - registry changes made through the public API
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::types::{StallPolicy, TaskId};

/// How a task body ended, as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// The body returned an error or panicked; carries a description.
    Failed(String),
}

/// Options shared by the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Concurrency budget. Always >= 1.
    pub max_parallel_tasks: usize,
    pub stall_policy: StallPolicy,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            max_parallel_tasks: crate::config::model::default_max_parallel_tasks(),
            stall_policy: StallPolicy::default(),
        }
    }
}

/// Events flowing into the run loop from task runners and the public API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Tasks were added, reprioritized or canceled; re-evaluate readiness.
    RegistryChanged,
    /// A running task exceeded its timeout. Its body is still running.
    TaskTimedOut { task: TaskId },
    /// A task body returned (or panicked). Releases the task's slot.
    TaskExited { task: TaskId, outcome: TaskOutcome },
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;

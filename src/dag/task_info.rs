// src/dag/task_info.rs

//! Task records, registration options and dispatch descriptions.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::ConfigFile;
use crate::exec::TaskWork;
use crate::types::{DEFAULT_PRIORITY, Priority, TaskId, TaskStatus};

/// Registration options for a task.
///
/// Defaults: priority 1, no dependencies, no timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOptions {
    pub priority: Priority,
    pub dependencies: Vec<TaskId>,
    pub timeout: Option<Duration>,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            dependencies: Vec::new(),
            timeout: None,
        }
    }
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults taken from the `[scheduler]` config section.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            priority: cfg.scheduler().default_priority,
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn after(mut self, dep: TaskId) -> Self {
        self.dependencies.push(dep);
        self
    }

    pub fn after_all(mut self, deps: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies.extend(deps);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The registry's view of one task.
#[derive(Debug)]
pub struct TaskRecord {
    pub id: TaskId,
    pub priority: Priority,
    pub dependencies: Vec<TaskId>,
    pub timeout: Option<Duration>,
    pub status: TaskStatus,
    /// Taken exactly once, when the task is dispatched.
    pub(crate) work: Option<TaskWork>,
    pub(crate) signal: CancellationToken,
    /// Whether the task currently occupies a concurrency slot. Stays set after
    /// a timeout until the body actually exits.
    pub(crate) holds_slot: bool,
}

impl TaskRecord {
    pub(crate) fn new(id: TaskId, work: TaskWork, options: TaskOptions) -> Self {
        Self {
            id,
            priority: options.priority,
            dependencies: options.dependencies,
            timeout: options.timeout,
            status: TaskStatus::Pending,
            work: Some(work),
            signal: CancellationToken::new(),
            holds_slot: false,
        }
    }
}

/// A cancellation signal the registry decided to fire.
///
/// Registry transitions hand these back instead of firing them, so callers
/// can trigger the tokens after releasing the registry lock.
#[derive(Debug)]
#[must_use = "the cancellation signal is only triggered by calling `fire`"]
pub struct PendingSignal {
    pub task: TaskId,
    signal: CancellationToken,
}

impl PendingSignal {
    pub(crate) fn new(task: TaskId, signal: CancellationToken) -> Self {
        Self { task, signal }
    }

    pub fn fire(self) {
        self.signal.cancel();
    }
}

/// Description of a task that the loop wants the executor to run now.
#[derive(Debug)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub priority: Priority,
    pub timeout: Option<Duration>,
    /// Clone of the record's cancellation token, handed to the work.
    pub signal: CancellationToken,
    pub work: TaskWork,
}

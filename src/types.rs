use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Ordering key for ready tasks; higher runs first.
pub type Priority = i64;

/// Priority assigned when the caller does not pick one.
pub const DEFAULT_PRIORITY: Priority = 1;

/// Opaque task identifier minted by the registry.
///
/// Ids come from a monotonically increasing counter, so comparing two ids
/// also compares their registration order. They render as `task<N>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn from_sequence(seq: u64) -> Self {
        TaskId(seq)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .strip_prefix("task")
            .and_then(|n| n.parse::<u64>().ok())
            .map(TaskId)
            .ok_or_else(|| format!("invalid task id: {s} (expected \"task<N>\")"))
    }
}

/// Lifecycle status of a task.
///
/// `Pending` and `Running` are the only non-terminal states; once a task
/// reaches any other status it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
    Timeout,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Canceled => "canceled",
            TaskStatus::Timeout => "timeout",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the run loop does when it stalls: nothing running, nothing ready,
/// but some tasks still pending behind dependencies that cannot complete.
///
/// - `Wait`: keep waiting for outside changes (a cancel or a newly added
///   task). A run whose blocked tasks are never resolved does not finish.
/// - `CancelBlocked`: cancel every blocked pending task so the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallPolicy {
    Wait,
    CancelBlocked,
}

impl Default for StallPolicy {
    fn default() -> Self {
        StallPolicy::Wait
    }
}

/// Log level as accepted in the `[logging]` config section.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// src/dag/registry.rs

//! Task registry: the single owner of every task record.
//!
//! All mutation goes through this type. The scheduler wraps it in one mutex;
//! nothing here blocks or awaits.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::dag::graph::{DependencyIndex, validate_dependencies};
use crate::dag::task_info::{PendingSignal, ScheduledTask, TaskOptions, TaskRecord};
use crate::engine::TaskOutcome;
use crate::errors::Result;
use crate::exec::TaskWork;
use crate::types::{Priority, TaskId, TaskStatus};

/// Lock a shared registry.
///
/// Registry methods never leave a record half-updated, so a poisoned lock
/// (a panic elsewhere while holding it) still guards consistent data.
pub fn lock_registry(shared: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct Registry {
    /// Keyed by id; ids are minted in order, so iteration is insertion order.
    tasks: BTreeMap<TaskId, TaskRecord>,
    index: DependencyIndex,
    last_seq: u64,
    /// Number of tasks holding a concurrency slot.
    running_count: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new `pending` task and return its freshly minted id.
    pub fn add(&mut self, work: TaskWork, options: TaskOptions) -> TaskId {
        self.last_seq += 1;
        let id = TaskId::from_sequence(self.last_seq);

        self.index.insert(id, &options.dependencies);

        debug!(
            task = %id,
            priority = options.priority,
            deps = ?options.dependencies,
            timeout = ?options.timeout,
            "registered task"
        );

        self.tasks.insert(id, TaskRecord::new(id, work, options));
        id
    }

    /// Change the priority of a task that has not started yet.
    ///
    /// Unknown, running and terminal tasks are left untouched. Returns whether
    /// the priority was applied.
    pub fn set_priority(&mut self, id: TaskId, priority: Priority) -> bool {
        match self.tasks.get_mut(&id) {
            Some(record) if record.status == TaskStatus::Pending => {
                debug!(task = %id, from = record.priority, to = priority, "priority changed");
                record.priority = priority;
                true
            }
            Some(record) => {
                debug!(task = %id, status = %record.status, "priority change ignored; task already started");
                false
            }
            None => {
                debug!(task = %id, "priority change for unknown task; ignoring");
                false
            }
        }
    }

    /// Cancel a pending task and, transitively, its pending dependents.
    ///
    /// A no-op unless `id` is `pending`. The cascade walks dependency ->
    /// dependent edges depth-first; a dependent that is not pending is left
    /// alone and its own dependents are not visited through it.
    ///
    /// Returns the signals of every task that was canceled, in cancellation
    /// order. The caller fires them.
    #[must_use = "canceled tasks are only signaled once the returned signals are fired"]
    pub fn cancel(&mut self, id: TaskId) -> Vec<PendingSignal> {
        let mut canceled = Vec::new();
        let mut stack: Vec<TaskId> = vec![id];

        while let Some(current) = stack.pop() {
            let Some(record) = self.tasks.get_mut(&current) else {
                continue;
            };
            if record.status != TaskStatus::Pending {
                continue;
            }

            record.status = TaskStatus::Canceled;
            if current == id {
                info!(task = %current, "task canceled");
            } else {
                info!(task = %current, root = %id, "task canceled by cascade");
            }
            canceled.push(PendingSignal::new(current, record.signal.clone()));

            // Reverse so dependents are visited in registration order.
            stack.extend(self.index.dependents_of(current).iter().rev().copied());
        }

        canceled
    }

    /// Point-in-time copy of every task's status.
    pub fn snapshot(&self) -> BTreeMap<TaskId, TaskStatus> {
        self.tasks
            .iter()
            .map(|(id, record)| (*id, record.status))
            .collect()
    }

    pub fn status_of(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&id).map(|r| r.status)
    }

    pub fn priority_of(&self, id: TaskId) -> Option<Priority> {
        self.tasks.get(&id).map(|r| r.priority)
    }

    pub fn dependencies_of(&self, id: TaskId) -> Option<&[TaskId]> {
        self.tasks.get(&id).map(|r| r.dependencies.as_slice())
    }

    /// Number of tasks currently holding a concurrency slot.
    ///
    /// This includes timed-out tasks whose body has not returned yet.
    pub fn running_count(&self) -> usize {
        self.running_count
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether every registered task reached a terminal status.
    pub fn all_terminal(&self) -> bool {
        self.tasks.values().all(|r| r.status.is_terminal())
    }

    /// Whether all dependencies of the given task are `completed`.
    ///
    /// Returns `None` if the task is unknown. A dependency that was never
    /// registered is not satisfied.
    pub fn deps_satisfied(&self, id: TaskId) -> Option<bool> {
        let record = self.tasks.get(&id)?;
        Some(self.deps_satisfied_for(record))
    }

    fn deps_satisfied_for(&self, record: &TaskRecord) -> bool {
        record.dependencies.iter().all(|dep| {
            matches!(
                self.tasks.get(dep).map(|d| d.status),
                Some(TaskStatus::Completed)
            )
        })
    }

    /// Pending tasks whose dependencies are all completed, highest priority
    /// first, ties broken by registration order.
    pub fn ready_tasks(&self) -> Vec<TaskId> {
        let mut ready: Vec<(Priority, TaskId)> = self
            .tasks
            .values()
            .filter(|r| r.status == TaskStatus::Pending && self.deps_satisfied_for(r))
            .map(|r| (r.priority, r.id))
            .collect();

        ready.sort_by_key(|&(priority, id)| (Reverse(priority), id));
        ready.into_iter().map(|(_, id)| id).collect()
    }

    /// Whether the run is stuck: no task running, nothing ready, but some
    /// tasks still pending.
    ///
    /// Slots held by timed-out bodies do not count; those tasks are already
    /// terminal and can never unblock a dependent.
    pub fn is_stalled(&self) -> bool {
        !self.tasks.values().any(|r| r.status == TaskStatus::Running)
            && self.tasks.values().any(|r| r.status == TaskStatus::Pending)
            && self.ready_tasks().is_empty()
    }

    /// Move up to `max_parallel - running_count` ready tasks to `running`
    /// and hand them out for execution.
    pub fn dispatch_ready(&mut self, max_parallel: usize) -> Vec<ScheduledTask> {
        let slots = max_parallel.saturating_sub(self.running_count);
        if slots == 0 {
            return Vec::new();
        }

        let candidates: Vec<TaskId> = self.ready_tasks().into_iter().take(slots).collect();
        let mut scheduled = Vec::with_capacity(candidates.len());

        for id in candidates {
            let Some(record) = self.tasks.get_mut(&id) else {
                continue;
            };
            // Pending records always carry their work; it is only taken here.
            let Some(work) = record.work.take() else {
                continue;
            };

            record.status = TaskStatus::Running;
            record.holds_slot = true;
            self.running_count += 1;

            info!(
                task = %id,
                priority = record.priority,
                running = self.running_count,
                "dependencies satisfied; marking Running"
            );

            scheduled.push(ScheduledTask {
                id,
                priority: record.priority,
                timeout: record.timeout,
                signal: record.signal.clone(),
                work,
            });
        }

        scheduled
    }

    /// Mark a running task as timed out.
    ///
    /// Returns its signal for the caller to fire, or `None` if the task was no
    /// longer running. The task keeps its slot until [`Registry::finish`].
    pub fn mark_timed_out(&mut self, id: TaskId) -> Option<PendingSignal> {
        let record = self.tasks.get_mut(&id)?;
        if record.status != TaskStatus::Running {
            debug!(task = %id, status = %record.status, "timeout for task that is no longer running; ignoring");
            return None;
        }

        record.status = TaskStatus::Timeout;
        warn!(task = %id, timeout = ?record.timeout, "task timed out; requesting cancellation");
        Some(PendingSignal::new(id, record.signal.clone()))
    }

    /// Record that a task body returned, releasing its slot.
    ///
    /// A task still `running` becomes `completed` or `failed`; a task already
    /// marked `timeout` keeps that status. Returns the resulting status, or
    /// `None` for an unknown task.
    pub fn finish(&mut self, id: TaskId, outcome: &TaskOutcome) -> Option<TaskStatus> {
        let record = self.tasks.get_mut(&id)?;

        if record.holds_slot {
            record.holds_slot = false;
            self.running_count = self.running_count.saturating_sub(1);
        } else {
            warn!(task = %id, "exit reported for task without a slot; ignoring");
            return Some(record.status);
        }

        if record.status == TaskStatus::Running {
            match outcome {
                TaskOutcome::Success => {
                    record.status = TaskStatus::Completed;
                    info!(task = %id, running = self.running_count, "task completed successfully");
                }
                TaskOutcome::Failed(reason) => {
                    record.status = TaskStatus::Failed;
                    warn!(task = %id, running = self.running_count, error = %reason, "task failed");
                }
            }
        } else {
            debug!(
                task = %id,
                status = %record.status,
                ?outcome,
                "task body exited after terminal status; outcome ignored"
            );
        }

        Some(record.status)
    }

    /// Cancel every pending task. Used when the run stalls.
    #[must_use = "canceled tasks are only signaled once the returned signals are fired"]
    pub fn cancel_blocked(&mut self) -> Vec<PendingSignal> {
        let pending: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|r| r.status == TaskStatus::Pending)
            .map(|r| r.id)
            .collect();

        let mut signals = Vec::new();
        for id in pending {
            signals.extend(self.cancel(id));
        }
        signals
    }

    /// Reject unknown dependency ids and dependency cycles.
    pub fn validate_graph(&self) -> Result<()> {
        validate_dependencies(
            self.tasks
                .values()
                .map(|r| (r.id, r.dependencies.as_slice())),
        )
    }
}

// src/scheduler.rs

//! Public entry point: a cloneable handle over one registry and its run loop.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::dag::registry::lock_registry;
use crate::dag::{PendingSignal, Registry, TaskOptions};
use crate::engine::{CoreRuntime, Runtime, RuntimeOptions, SchedulerEvent};
use crate::errors::{Result, SchedulerError};
use crate::exec::{TaskWork, TokioExecutor};
use crate::types::{Priority, StallPolicy, TaskId, TaskStatus};

/// Bounded-concurrency task scheduler.
///
/// Cloning yields another handle to the same scheduler, so tasks can be
/// added, reprioritized or canceled from anywhere (including from inside a
/// running task body) while [`Scheduler::execute_tasks`] is in progress.
///
/// ```no_run
/// # async fn demo() -> taskdag::errors::Result<()> {
/// use taskdag::{Scheduler, TaskOptions};
///
/// let scheduler = Scheduler::new(2);
/// let fetch = scheduler.add_task(|_signal| async { Ok(()) }, TaskOptions::new());
/// scheduler.add_task(|_signal| async { Ok(()) }, TaskOptions::new().after(fetch));
/// scheduler.execute_tasks().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    options: RuntimeOptions,
    registry: Arc<Mutex<Registry>>,
    events_tx: mpsc::UnboundedSender<SchedulerEvent>,
    /// Held by the active `execute_tasks` call.
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<SchedulerEvent>>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("options", &self.inner.options)
            .field("tasks", &lock_registry(&self.inner.registry).len())
            .finish_non_exhaustive()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::with_options(RuntimeOptions::default())
    }
}

impl Scheduler {
    /// Create a scheduler running at most `max_parallel_tasks` bodies at once.
    ///
    /// A limit of 0 would never run anything and is raised to 1.
    pub fn new(max_parallel_tasks: usize) -> Self {
        Self::with_options(RuntimeOptions {
            max_parallel_tasks,
            ..RuntimeOptions::default()
        })
    }

    /// Create a scheduler from a validated config file.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let section = cfg.scheduler();
        Self::with_options(RuntimeOptions {
            max_parallel_tasks: section.max_parallel_tasks,
            stall_policy: section.stall_policy,
        })
    }

    pub fn with_options(mut options: RuntimeOptions) -> Self {
        if options.max_parallel_tasks == 0 {
            warn!("max_parallel_tasks = 0 would never run anything; using 1");
            options.max_parallel_tasks = 1;
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(Inner {
                options,
                registry: Arc::new(Mutex::new(Registry::new())),
                events_tx,
                events_rx: tokio::sync::Mutex::new(events_rx),
            }),
        }
    }

    pub fn max_parallel_tasks(&self) -> usize {
        self.inner.options.max_parallel_tasks
    }

    pub fn stall_policy(&self) -> StallPolicy {
        self.inner.options.stall_policy
    }

    /// Register a task. Never fails; dependencies are not checked here.
    pub fn add_task<F, Fut>(&self, work: F, options: TaskOptions) -> TaskId
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add_work(TaskWork::new(work), options)
    }

    /// Register an already boxed [`TaskWork`].
    pub fn add_work(&self, work: TaskWork, options: TaskOptions) -> TaskId {
        let id = lock_registry(&self.inner.registry).add(work, options);
        self.notify_changed();
        id
    }

    /// Change the priority of a task that has not started yet.
    ///
    /// Unknown, running and finished tasks are silently ignored.
    pub fn change_priority(&self, id: TaskId, priority: Priority) {
        let applied = lock_registry(&self.inner.registry).set_priority(id, priority);
        if applied {
            self.notify_changed();
        }
    }

    /// Cancel a pending task and every pending task that depends on it,
    /// directly or transitively. Tasks that are not pending are left alone.
    pub fn cancel_task(&self, id: TaskId) {
        let signals = lock_registry(&self.inner.registry).cancel(id);
        if signals.is_empty() {
            debug!(task = %id, "cancel_task had no effect");
            return;
        }

        fire_all(signals);
        self.notify_changed();
    }

    /// Point-in-time status of every registered task.
    pub fn get_status(&self) -> BTreeMap<TaskId, TaskStatus> {
        lock_registry(&self.inner.registry).snapshot()
    }

    pub fn status_of(&self, id: TaskId) -> Option<TaskStatus> {
        lock_registry(&self.inner.registry).status_of(id)
    }

    /// Number of tasks currently holding a concurrency slot.
    pub fn running_count(&self) -> usize {
        lock_registry(&self.inner.registry).running_count()
    }

    /// Fail if a dependency names an unregistered task or the dependency
    /// graph has a cycle. Such tasks could never become ready.
    pub fn validate_dependencies(&self) -> Result<()> {
        lock_registry(&self.inner.registry).validate_graph()
    }

    /// Run until every registered task reached a terminal status.
    ///
    /// Task failures do not make this return an error; inspect
    /// [`Scheduler::get_status`] afterwards. Returns
    /// [`SchedulerError::AlreadyExecuting`] if another call is in progress.
    /// Calling it again after it returned runs any tasks added since.
    pub async fn execute_tasks(&self) -> Result<()> {
        let mut events_rx = self
            .inner
            .events_rx
            .try_lock()
            .map_err(|_| SchedulerError::AlreadyExecuting)?;

        let core = CoreRuntime::new(self.inner.options);
        let executor = TokioExecutor::new(self.inner.events_tx.clone());
        let runtime = Runtime::new(
            core,
            Arc::clone(&self.inner.registry),
            &mut *events_rx,
            executor,
        );

        runtime.run().await
    }

    fn notify_changed(&self) {
        // The receiver lives in `Inner`, so this cannot fail while `self` exists.
        let _ = self.inner.events_tx.send(SchedulerEvent::RegistryChanged);
    }
}

fn fire_all(signals: Vec<PendingSignal>) {
    for signal in signals {
        signal.fire();
    }
}

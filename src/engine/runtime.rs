// src/engine/runtime.rs

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::registry::lock_registry;
use crate::dag::{Registry, ScheduledTask};
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::event_handlers::CoreStep;
use super::{CoreCommand, SchedulerEvent};

/// Drives the registry in response to [`SchedulerEvent`]s and delegates the
/// actual task execution to an [`ExecutorBackend`].
///
/// This is an IO shell around [`CoreRuntime`], which holds all the
/// scheduling semantics. The registry lock is only held while the core
/// computes a step, never across an `await`.
pub struct Runtime<'a, E: ExecutorBackend> {
    core: CoreRuntime,
    registry: Arc<Mutex<Registry>>,
    event_rx: &'a mut mpsc::UnboundedReceiver<SchedulerEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<'a, E: ExecutorBackend> Runtime<'a, E> {
    pub fn new(
        core: CoreRuntime,
        registry: Arc<Mutex<Registry>>,
        event_rx: &'a mut mpsc::UnboundedReceiver<SchedulerEvent>,
        executor: E,
    ) -> Self {
        Self {
            core,
            registry,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// Returns once every registered task is terminal. Bodies of timed-out
    /// tasks that are still unwinding at that point keep running; their exit
    /// events stay in the channel for the next run.
    pub async fn run(mut self) -> Result<()> {
        let mut backlog = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            backlog.push(event);
        }

        let mut step = {
            let mut registry = lock_registry(&self.registry);
            info!(
                tasks = registry.len(),
                max_parallel = self.core.options().max_parallel_tasks,
                backlog = backlog.len(),
                "scheduler run started"
            );
            self.core.start(&mut registry, backlog)
        };

        loop {
            let CoreStep {
                commands,
                keep_running,
            } = step;

            for command in commands {
                self.execute_command(command).await?;
            }

            if !keep_running {
                break;
            }

            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("scheduler event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "scheduler received event");

            step = {
                let mut registry = lock_registry(&self.registry);
                self.core.step(&mut registry, event)
            };
        }

        info!("scheduler run exiting");
        Ok(())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::FireSignals(signals) => {
                for signal in signals {
                    debug!(task = %signal.task, "firing cancellation signal");
                    signal.fire();
                }
            }
            CoreCommand::DispatchTasks(tasks) => {
                self.spawn_ready(tasks).await?;
            }
            CoreCommand::RunFinished => {
                debug!("core issued RunFinished command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let ids: Vec<_> = tasks.iter().map(|t| t.id.to_string()).collect();
        debug!(?ids, "spawning ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}

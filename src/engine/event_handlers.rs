// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::dag::{PendingSignal, Registry, ScheduledTask};
use crate::engine::{RuntimeOptions, TaskOutcome};
use crate::types::{StallPolicy, TaskId};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Trigger these cancellation signals (outside the registry lock).
    FireSignals(Vec<PendingSignal>),
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Every task is terminal; the run is over.
    RunFinished,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep waiting for events.
    pub keep_running: bool,
}

/// The public API changed the registry. Nothing to apply; readiness is
/// re-evaluated by [`advance`].
pub fn handle_registry_changed() -> Vec<CoreCommand> {
    Vec::new()
}

/// A task's timer fired while its body was still running.
pub fn handle_task_timed_out(registry: &mut Registry, task: TaskId) -> Vec<CoreCommand> {
    match registry.mark_timed_out(task) {
        Some(signal) => vec![CoreCommand::FireSignals(vec![signal])],
        None => Vec::new(),
    }
}

/// A task body returned; record the outcome and free its slot.
pub fn handle_task_exited(
    registry: &mut Registry,
    task: TaskId,
    outcome: TaskOutcome,
) -> Vec<CoreCommand> {
    match registry.finish(task, &outcome) {
        Some(status) => debug!(task = %task, %status, "task body exited"),
        None => warn!(task = %task, "exit reported for unknown task; ignoring"),
    }
    Vec::new()
}

/// Decide what happens next after the registry changed.
///
/// - If every task is terminal, the run finishes.
/// - Otherwise the highest-priority ready tasks fill the free slots.
/// - If nothing runs and nothing is ready, the stall policy applies.
pub fn advance(
    registry: &mut Registry,
    options: &RuntimeOptions,
    mut commands: Vec<CoreCommand>,
) -> CoreStep {
    if registry.all_terminal() {
        return finish(commands, registry);
    }

    let dispatched = registry.dispatch_ready(options.max_parallel_tasks);
    if !dispatched.is_empty() {
        commands.push(CoreCommand::DispatchTasks(dispatched));
        return CoreStep {
            commands,
            keep_running: true,
        };
    }

    if registry.is_stalled() {
        match options.stall_policy {
            StallPolicy::Wait => {
                warn!(
                    tasks = registry.len(),
                    "run stalled: pending tasks have unsatisfiable dependencies; waiting for changes"
                );
            }
            StallPolicy::CancelBlocked => {
                let signals = registry.cancel_blocked();
                warn!(
                    canceled = signals.len(),
                    "run stalled: canceling tasks with unsatisfiable dependencies"
                );
                commands.push(CoreCommand::FireSignals(signals));

                if registry.all_terminal() {
                    return finish(commands, registry);
                }
            }
        }
    }

    CoreStep {
        commands,
        keep_running: true,
    }
}

fn finish(mut commands: Vec<CoreCommand>, registry: &Registry) -> CoreStep {
    info!(
        tasks = registry.len(),
        still_unwinding = registry.running_count(),
        "all tasks terminal; run finished"
    );
    commands.push(CoreCommand::RunFinished);
    CoreStep {
        commands,
        keep_running: false,
    }
}

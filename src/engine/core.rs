// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`SchedulerEvent`]s against a [`Registry`] and produces a list of
//! "commands" describing what the IO shell should do next.
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the channel
//! - handing `ScheduledTask`s to the executor
//! - firing cancellation signals outside the registry lock
//!
//! The core can be driven directly in tests without Tokio, channels or real
//! task bodies.

use crate::dag::Registry;
use crate::engine::event_handlers::{
    CoreCommand, CoreStep, advance, handle_registry_changed, handle_task_exited,
    handle_task_timed_out,
};
use crate::engine::{RuntimeOptions, SchedulerEvent};

#[derive(Debug)]
pub struct CoreRuntime {
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// First evaluation of a run.
    ///
    /// `backlog` holds events queued since the previous run (typically exits
    /// of timed-out bodies that outlived it); they are applied before
    /// anything is dispatched so their slots are free again.
    pub fn start(
        &mut self,
        registry: &mut Registry,
        backlog: impl IntoIterator<Item = SchedulerEvent>,
    ) -> CoreStep {
        let mut commands = Vec::new();
        for event in backlog {
            commands.extend(self.apply(registry, event));
        }

        advance(registry, &self.options, commands)
    }

    /// Handle a single event, updating the registry and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, registry: &mut Registry, event: SchedulerEvent) -> CoreStep {
        let commands = self.apply(registry, event);
        advance(registry, &self.options, commands)
    }

    /// Apply an event to the registry without deciding what runs next.
    fn apply(&mut self, registry: &mut Registry, event: SchedulerEvent) -> Vec<CoreCommand> {
        match event {
            SchedulerEvent::RegistryChanged => handle_registry_changed(),
            SchedulerEvent::TaskTimedOut { task } => handle_task_timed_out(registry, task),
            SchedulerEvent::TaskExited { task, outcome } => {
                handle_task_exited(registry, task, outcome)
            }
        }
    }
}

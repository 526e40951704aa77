use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use taskdag::TaskId;
use taskdag::dag::ScheduledTask;
use taskdag::engine::{SchedulerEvent, TaskOutcome};
use taskdag::errors::Result;
use taskdag::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were dispatched, in order
/// - never invokes the task bodies
/// - immediately reports `TaskExited` for each dispatched task, failing the
///   ones listed in `failing`.
pub struct FakeExecutor {
    events: mpsc::UnboundedSender<SchedulerEvent>,
    executed: Arc<Mutex<Vec<TaskId>>>,
    failing: HashSet<TaskId>,
}

impl FakeExecutor {
    pub fn new(
        events: mpsc::UnboundedSender<SchedulerEvent>,
        executed: Arc<Mutex<Vec<TaskId>>>,
    ) -> Self {
        Self {
            events,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, id: TaskId) -> Self {
        self.failing.insert(id);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.events.clone();
        let executed = Arc::clone(&self.executed);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.id);
                }

                let outcome = if failing.contains(&t.id) {
                    TaskOutcome::Failed("fake failure".to_string())
                } else {
                    TaskOutcome::Success
                };

                tx.send(SchedulerEvent::TaskExited {
                    task: t.id,
                    outcome,
                })
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}

// src/exec/task_runner.rs

//! Individual task runner.

use std::any::Any;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{SchedulerEvent, TaskOutcome};

/// Run a single task body to completion.
///
/// - The body runs in its own Tokio task, so a panic is reported as a
///   failure instead of tearing down the runner.
/// - If the timeout elapses first, `TaskTimedOut` is sent and the runner
///   keeps waiting: the slot is only released once the body returns.
/// - Exactly one `TaskExited` is sent per invocation, always last.
pub async fn run_task(task: ScheduledTask, events: mpsc::UnboundedSender<SchedulerEvent>) {
    let ScheduledTask {
        id,
        priority,
        timeout,
        signal,
        work,
    } = task;

    info!(task = %id, priority, ?timeout, "starting task body");

    let mut body = tokio::spawn(work.invoke(signal));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut body).await {
            Ok(joined) => joined,
            Err(_elapsed) => {
                warn!(task = %id, ?limit, "task exceeded its timeout");
                if events.send(SchedulerEvent::TaskTimedOut { task: id }).is_err() {
                    debug!(task = %id, "scheduler gone; timeout not reported");
                }
                body.await
            }
        },
        None => body.await,
    };

    let outcome = match joined {
        Ok(Ok(())) => TaskOutcome::Success,
        Ok(Err(err)) => TaskOutcome::Failed(format!("{err:#}")),
        Err(join_err) if join_err.is_panic() => {
            let msg = panic_message(join_err.into_panic());
            error!(task = %id, panic = %msg, "task body panicked");
            TaskOutcome::Failed(format!("panicked: {msg}"))
        }
        Err(join_err) => TaskOutcome::Failed(format!("task body aborted: {join_err}")),
    };

    debug!(task = %id, ?outcome, "task body returned");

    if events
        .send(SchedulerEvent::TaskExited { task: id, outcome })
        .is_err()
    {
        debug!(task = %id, "scheduler gone; exit not reported");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

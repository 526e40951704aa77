// tests/property_scheduler.rs

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use taskdag::dag::Registry;
use taskdag::engine::{
    CoreCommand, CoreRuntime, CoreStep, RuntimeOptions, SchedulerEvent, TaskOutcome,
};
use taskdag::{StallPolicy, TaskId, TaskOptions, TaskStatus, TaskWork};

#[derive(Debug, Clone)]
struct TaskPlan {
    priority: i64,
    /// Indices into earlier tasks; taken modulo the task's own index.
    deps: Vec<usize>,
    /// Depend on a task id that is never registered.
    missing_dep: bool,
    fails: bool,
    times_out: bool,
}

fn task_plan() -> impl Strategy<Value = TaskPlan> {
    (
        -3i64..=3,
        proptest::collection::vec(any::<usize>(), 0..3),
        proptest::bool::weighted(0.1),
        proptest::bool::weighted(0.2),
        proptest::bool::weighted(0.1),
    )
        .prop_map(|(priority, deps, missing_dep, fails, times_out)| TaskPlan {
            priority,
            deps,
            missing_dep,
            fails,
            times_out,
        })
}

fn noop() -> TaskWork {
    TaskWork::new(|_signal| async { Ok(()) })
}

/// Apply a core step: collect dispatched ids and check invariants that must
/// hold right after dispatch.
fn absorb(
    step: CoreStep,
    registry: &Registry,
    max_parallel: usize,
    executing: &mut Vec<TaskId>,
) -> Result<bool, TestCaseError> {
    for command in step.commands {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                for task in tasks {
                    for dep in registry.dependencies_of(task.id).unwrap_or(&[]) {
                        prop_assert_eq!(
                            registry.status_of(*dep),
                            Some(TaskStatus::Completed),
                            "{} dispatched before dependency {} completed",
                            task.id,
                            dep
                        );
                    }
                    executing.push(task.id);
                }
            }
            CoreCommand::FireSignals(signals) => signals.into_iter().for_each(|s| s.fire()),
            CoreCommand::RunFinished => {}
        }
    }
    prop_assert!(registry.running_count() <= max_parallel);
    Ok(step.keep_running)
}

fn check_monotonic(
    before: &BTreeMap<TaskId, TaskStatus>,
    after: &BTreeMap<TaskId, TaskStatus>,
) -> Result<(), TestCaseError> {
    for (id, status) in before {
        if status.is_terminal() {
            prop_assert_eq!(after.get(id), Some(status), "terminal status of {} changed", id);
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn run_terminates_and_respects_limits(
        plans in proptest::collection::vec(task_plan(), 1..12),
        max_parallel in 1usize..=4,
        cancels in proptest::collection::vec(any::<usize>(), 0..3),
    ) {
        let mut registry = Registry::new();
        let ghost: TaskId = "task999".parse().unwrap();
        let mut ids = Vec::with_capacity(plans.len());

        for (i, plan) in plans.iter().enumerate() {
            let mut options = TaskOptions::new().priority(plan.priority);
            if i > 0 {
                let deps: HashSet<usize> = plan.deps.iter().map(|d| d % i).collect();
                options = options.after_all(deps.into_iter().map(|d| ids[d]));
            }
            if plan.missing_dep {
                options = options.after(ghost);
            }
            ids.push(registry.add(noop(), options));
        }

        let options = RuntimeOptions {
            max_parallel_tasks: max_parallel,
            stall_policy: StallPolicy::CancelBlocked,
        };
        let mut core = CoreRuntime::new(options);
        let mut executing: Vec<TaskId> = Vec::new();
        let mut pending_cancels = cancels.into_iter();

        let step = core.start(&mut registry, Vec::new());
        let mut keep_running = absorb(step, &registry, max_parallel, &mut executing)?;

        let mut steps = 0;
        let max_steps = 1000;

        while keep_running && steps < max_steps {
            steps += 1;
            let before = registry.snapshot();

            // Interleave external cancellations with task exits.
            if let Some(raw) = pending_cancels.next() {
                let signals = registry.cancel(ids[raw % ids.len()]);
                signals.into_iter().for_each(|s| s.fire());
                let step = core.step(&mut registry, SchedulerEvent::RegistryChanged);
                keep_running = absorb(step, &registry, max_parallel, &mut executing)?;
                check_monotonic(&before, &registry.snapshot())?;
                continue;
            }

            prop_assert!(!executing.is_empty(), "run neither finished nor has running tasks");
            let task = executing.remove(0);
            let plan = &plans[ids.iter().position(|id| *id == task).unwrap()];

            if plan.times_out {
                let step = core.step(&mut registry, SchedulerEvent::TaskTimedOut { task });
                keep_running = absorb(step, &registry, max_parallel, &mut executing)?;
                prop_assert_eq!(registry.status_of(task), Some(TaskStatus::Timeout));
                check_monotonic(&before, &registry.snapshot())?;

                // The run may end while the timed-out body is still unwinding.
                if !keep_running {
                    break;
                }
            }

            let outcome = if plan.fails {
                TaskOutcome::Failed("boom".to_string())
            } else {
                TaskOutcome::Success
            };
            let step = core.step(&mut registry, SchedulerEvent::TaskExited { task, outcome });
            keep_running = absorb(step, &registry, max_parallel, &mut executing)?;

            check_monotonic(&before, &registry.snapshot())?;
        }

        prop_assert!(steps < max_steps, "simulation did not terminate");
        prop_assert!(registry.all_terminal());
    }
}

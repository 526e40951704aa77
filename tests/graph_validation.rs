// tests/graph_validation.rs

mod common;
use crate::common::{Probe, init_tracing, ms, with_timeout};

use std::error::Error;

use taskdag::engine::RuntimeOptions;
use taskdag::{Scheduler, SchedulerError, StallPolicy, TaskId, TaskOptions, TaskStatus};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn valid_graph_passes() {
    let scheduler = Scheduler::new(2);
    let a = scheduler.add_task(|_| async { Ok(()) }, TaskOptions::new());
    let b = scheduler.add_task(|_| async { Ok(()) }, TaskOptions::new().after(a));
    scheduler.add_task(|_| async { Ok(()) }, TaskOptions::new().after_all([a, b]));

    assert!(scheduler.validate_dependencies().is_ok());
}

#[test]
fn unknown_dependency_is_reported() -> TestResult {
    let scheduler = Scheduler::new(2);
    let ghost: TaskId = "task42".parse()?;
    let orphan = scheduler.add_task(|_| async { Ok(()) }, TaskOptions::new().after(ghost));

    match scheduler.validate_dependencies() {
        Err(SchedulerError::UnknownDependency { task, dependency }) => {
            assert_eq!(task, orphan);
            assert_eq!(dependency, ghost);
        }
        other => panic!("expected UnknownDependency, got {other:?}"),
    }
    Ok(())
}

#[test]
fn cycle_through_forward_reference_is_reported() -> TestResult {
    let scheduler = Scheduler::new(2);

    // Ids are minted sequentially, so the second task will be `task2`.
    let future: TaskId = "task2".parse()?;
    let first = scheduler.add_task(|_| async { Ok(()) }, TaskOptions::new().after(future));
    let second = scheduler.add_task(|_| async { Ok(()) }, TaskOptions::new().after(first));
    assert_eq!(second, future);

    assert!(matches!(
        scheduler.validate_dependencies(),
        Err(SchedulerError::DependencyCycle(_))
    ));
    Ok(())
}

#[test]
fn self_dependency_is_a_cycle() -> TestResult {
    let scheduler = Scheduler::new(1);
    let own: TaskId = "task1".parse()?;
    let id = scheduler.add_task(|_| async { Ok(()) }, TaskOptions::new().after(own));
    assert_eq!(id, own);

    assert!(matches!(
        scheduler.validate_dependencies(),
        Err(SchedulerError::DependencyCycle(_))
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cyclic_tasks_are_canceled_when_the_run_stalls() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::with_options(RuntimeOptions {
        max_parallel_tasks: 2,
        stall_policy: StallPolicy::CancelBlocked,
    });
    let probe = Probe::new();

    let future: TaskId = "task2".parse()?;
    let first = scheduler.add_work(
        probe.succeed_after("first", ms(5)),
        TaskOptions::new().after(future),
    );
    let second = scheduler.add_work(
        probe.succeed_after("second", ms(5)),
        TaskOptions::new().after(first),
    );
    let free = scheduler.add_work(probe.succeed_after("free", ms(5)), TaskOptions::new());

    with_timeout(scheduler.execute_tasks()).await?;

    let status = scheduler.get_status();
    assert_eq!(status[&first], TaskStatus::Canceled);
    assert_eq!(status[&second], TaskStatus::Canceled);
    assert_eq!(status[&free], TaskStatus::Completed);
    assert_eq!(probe.started(), vec!["free"]);
    Ok(())
}

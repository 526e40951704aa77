// tests/timeout_behaviour.rs

mod common;
use crate::common::{Probe, ProbeEvent, init_tracing, ms, with_timeout};

use std::error::Error;

use tokio::time::Instant;

use taskdag::{Scheduler, TaskOptions, TaskStatus};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(start_paused = true)]
async fn hanging_task_times_out_and_is_signaled() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::new(1);
    let probe = Probe::new();

    let stuck = scheduler.add_work(
        probe.hang_until_canceled("stuck"),
        TaskOptions::new().timeout(ms(100)),
    );

    let started = Instant::now();
    with_timeout(scheduler.execute_tasks()).await?;

    let elapsed = started.elapsed();
    assert_eq!(scheduler.status_of(stuck), Some(TaskStatus::Timeout));
    assert!(elapsed >= ms(100) && elapsed < ms(110), "elapsed {elapsed:?}");

    // Give the signaled body a chance to observe its token.
    tokio::time::sleep(ms(1)).await;
    assert_eq!(probe.cancel_count("stuck"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn task_within_its_timeout_completes_normally() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::new(1);
    let probe = Probe::new();

    let quick = scheduler.add_work(
        probe.succeed_after("quick", ms(30)),
        TaskOptions::new().timeout(ms(100)),
    );

    with_timeout(scheduler.execute_tasks()).await?;

    assert_eq!(scheduler.status_of(quick), Some(TaskStatus::Completed));
    assert_eq!(probe.cancel_count("quick"), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timed_out_task_keeps_its_slot_until_the_body_exits() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::new(1);
    let probe = Probe::new();

    let slow = scheduler.add_work(
        probe.linger_after_cancel("slow", ms(200)),
        TaskOptions::new().priority(10).timeout(ms(50)),
    );
    let next = scheduler.add_work(probe.succeed_after("next", ms(10)), TaskOptions::new());

    with_timeout(scheduler.execute_tasks()).await?;

    // The lingering body returned Ok, but the timeout already decided.
    assert_eq!(scheduler.status_of(slow), Some(TaskStatus::Timeout));
    assert_eq!(scheduler.status_of(next), Some(TaskStatus::Completed));

    let slow_done = probe
        .position(&ProbeEvent::Finished("slow".into()))
        .ok_or("slow never finished")?;
    let next_started = probe
        .position(&ProbeEvent::Started("next".into()))
        .ok_or("next never started")?;
    assert!(slow_done < next_started);
    assert_eq!(probe.max_concurrent(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn detached_body_slot_is_reclaimed_by_the_next_run() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::new(1);
    let probe = Probe::new();

    let slow = scheduler.add_work(
        probe.linger_after_cancel("slow", ms(200)),
        TaskOptions::new().timeout(ms(50)),
    );

    // Every task is terminal after the timeout, so the run returns while the
    // body is still unwinding.
    with_timeout(scheduler.execute_tasks()).await?;
    assert_eq!(scheduler.status_of(slow), Some(TaskStatus::Timeout));
    assert_eq!(scheduler.running_count(), 1);

    tokio::time::sleep(ms(500)).await;

    let next = scheduler.add_work(probe.succeed_after("next", ms(10)), TaskOptions::new());
    with_timeout(scheduler.execute_tasks()).await?;

    assert_eq!(scheduler.status_of(next), Some(TaskStatus::Completed));
    assert_eq!(scheduler.status_of(slow), Some(TaskStatus::Timeout));
    assert_eq!(scheduler.running_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dependents_of_a_timed_out_task_stay_blocked() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::with_options(taskdag::engine::RuntimeOptions {
        max_parallel_tasks: 2,
        stall_policy: taskdag::StallPolicy::CancelBlocked,
    });
    let probe = Probe::new();

    let stuck = scheduler.add_work(
        probe.hang_until_canceled("stuck"),
        TaskOptions::new().timeout(ms(40)),
    );
    let after = scheduler.add_work(
        probe.succeed_after("after", ms(10)),
        TaskOptions::new().after(stuck),
    );

    with_timeout(scheduler.execute_tasks()).await?;

    assert_eq!(scheduler.status_of(stuck), Some(TaskStatus::Timeout));
    assert_eq!(scheduler.status_of(after), Some(TaskStatus::Canceled));
    assert_eq!(probe.started(), vec!["stuck"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dependents_of_a_stuck_timed_out_body_are_canceled() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::with_options(taskdag::engine::RuntimeOptions {
        max_parallel_tasks: 2,
        stall_policy: taskdag::StallPolicy::CancelBlocked,
    });
    let probe = Probe::new();

    // The body ignores its signal, so its slot is never released.
    let stuck = scheduler.add_work(
        probe.ignore_cancel("stuck"),
        TaskOptions::new().timeout(ms(100)),
    );
    let after = scheduler.add_work(
        probe.succeed_after("after", ms(10)),
        TaskOptions::new().after(stuck),
    );

    with_timeout(scheduler.execute_tasks()).await?;

    assert_eq!(scheduler.status_of(stuck), Some(TaskStatus::Timeout));
    assert_eq!(scheduler.status_of(after), Some(TaskStatus::Canceled));
    assert_eq!(scheduler.running_count(), 1);
    assert_eq!(probe.started(), vec!["stuck"]);
    Ok(())
}

#[test]
fn slot_held_by_timed_out_task_does_not_hide_a_stall() {
    let mut registry = taskdag::dag::Registry::new();
    let stuck = registry.add(
        taskdag::TaskWork::new(|_signal| async { Ok(()) }),
        TaskOptions::new(),
    );
    let after = registry.add(
        taskdag::TaskWork::new(|_signal| async { Ok(()) }),
        TaskOptions::new().after(stuck),
    );

    let dispatched = registry.dispatch_ready(2);
    assert_eq!(dispatched.len(), 1);
    assert!(!registry.is_stalled());

    let signal = registry.mark_timed_out(stuck);
    assert!(signal.is_some());
    signal.into_iter().for_each(|s| s.fire());

    assert_eq!(registry.running_count(), 1);
    assert!(registry.is_stalled());

    let canceled = registry.cancel_blocked();
    assert_eq!(canceled.len(), 1);
    assert_eq!(canceled[0].task, after);
    assert!(registry.all_terminal());
}

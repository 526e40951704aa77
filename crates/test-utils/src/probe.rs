use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use taskdag::TaskWork;

/// Something a probed task body did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    Started(String),
    Finished(String),
    /// The body observed its cancellation signal.
    Canceled(String),
}

#[derive(Debug, Default)]
struct ProbeState {
    events: Vec<ProbeEvent>,
    running: usize,
    max_running: usize,
}

/// Shared recorder for task bodies built in tests.
///
/// Each work item built from a probe logs when it starts, when it finishes
/// and whether it saw its cancellation signal, and the probe tracks how many
/// bodies were running at the same time.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    state: Arc<Mutex<ProbeState>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `duration` (or until canceled), then succeed.
    pub fn succeed_after(&self, label: &str, duration: Duration) -> TaskWork {
        self.sleeper(label, duration, None)
    }

    /// Sleep for `duration` (or until canceled), then fail with `reason`.
    pub fn fail_after(&self, label: &str, duration: Duration, reason: &str) -> TaskWork {
        self.sleeper(label, duration, Some(reason.to_string()))
    }

    /// Never finishes on its own; returns an error once canceled.
    pub fn hang_until_canceled(&self, label: &str) -> TaskWork {
        let probe = self.clone();
        let label = label.to_string();

        TaskWork::new(move |signal| async move {
            probe.record_start(&label);
            signal.cancelled().await;
            probe.record(ProbeEvent::Canceled(label.clone()));
            probe.record_finish(&label);
            Err(anyhow!("{label} canceled"))
        })
    }

    /// Never returns, whether or not its cancellation signal fires.
    pub fn ignore_cancel(&self, label: &str) -> TaskWork {
        let probe = self.clone();
        let label = label.to_string();

        TaskWork::new(move |_signal| async move {
            probe.record_start(&label);
            std::future::pending::<()>().await;
            Ok(())
        })
    }

    /// Keeps running for `linger` after its cancellation signal fires, then
    /// succeeds anyway.
    pub fn linger_after_cancel(&self, label: &str, linger: Duration) -> TaskWork {
        let probe = self.clone();
        let label = label.to_string();

        TaskWork::new(move |signal| async move {
            probe.record_start(&label);
            signal.cancelled().await;
            probe.record(ProbeEvent::Canceled(label.clone()));
            tokio::time::sleep(linger).await;
            probe.record_finish(&label);
            Ok(())
        })
    }

    /// Panics right after starting.
    pub fn panicking(&self, label: &str) -> TaskWork {
        let probe = self.clone();
        let label = label.to_string();

        TaskWork::new(move |_signal| async move {
            probe.record_start(&label);
            explode(&label)
        })
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.state.lock().unwrap().events.clone()
    }

    /// Labels in the order their bodies started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProbeEvent::Started(label) => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn cancel_count(&self, label: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProbeEvent::Canceled(l) if l == label))
            .count()
    }

    /// Largest number of bodies that were running at once.
    pub fn max_concurrent(&self) -> usize {
        self.state.lock().unwrap().max_running
    }

    /// Position of an event in the log, if it happened.
    pub fn position(&self, event: &ProbeEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    fn sleeper(&self, label: &str, duration: Duration, failure: Option<String>) -> TaskWork {
        let probe = self.clone();
        let label = label.to_string();

        TaskWork::new(move |signal| async move {
            probe.record_start(&label);
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = signal.cancelled() => {
                    probe.record(ProbeEvent::Canceled(label.clone()));
                }
            }
            probe.record_finish(&label);

            match failure {
                Some(reason) => Err(anyhow!("{label}: {reason}")),
                None => Ok(()),
            }
        })
    }

    fn record_start(&self, label: &str) {
        let mut state = self.state.lock().unwrap();
        state.running += 1;
        state.max_running = state.max_running.max(state.running);
        state.events.push(ProbeEvent::Started(label.to_string()));
    }

    fn record_finish(&self, label: &str) {
        let mut state = self.state.lock().unwrap();
        state.running = state.running.saturating_sub(1);
        state.events.push(ProbeEvent::Finished(label.to_string()));
    }

    fn record(&self, event: ProbeEvent) {
        self.state.lock().unwrap().events.push(event);
    }
}

fn explode(label: &str) -> anyhow::Result<()> {
    panic!("{label} exploded")
}

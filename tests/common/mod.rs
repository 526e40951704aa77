#![allow(dead_code)]

use std::time::Duration;

pub use taskdag_test_utils::probe::{Probe, ProbeEvent};
pub use taskdag_test_utils::{init_tracing, with_timeout};

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

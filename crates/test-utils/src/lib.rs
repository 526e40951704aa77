//! Shared helpers for taskdag's integration tests.

pub mod fake_executor;
pub mod probe;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for a single awaited operation in tests. Under a paused
/// Tokio clock this is virtual time.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Install a per-test tracing subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests (or with `--nocapture`). `RUST_LOG` overrides the default of
/// `taskdag=debug` for the library and `warn` elsewhere.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,taskdag=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_DEADLINE, f).await {
        Ok(value) => value,
        Err(_) => panic!("test operation exceeded {TEST_DEADLINE:?}"),
    }
}

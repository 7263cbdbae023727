//! Shared helpers for spoolr's integration tests.
//!
//! - [`builders`]: config and connection-policy builders.
//! - [`fake_endpoint`]: scripted endpoints plus a shared call trace.
//! - [`recording`]: collaborators that record every call they receive.
//! - [`scripts`]: temporary scripts directories.

pub mod builders;
pub mod fake_endpoint;
pub mod recording;
pub mod scripts;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Generous bound for anything a test awaits; scripts are tiny.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Initialise tracing for tests, once per test binary.
///
/// Output is captured per test and only shown for failures. `RUST_LOG`
/// overrides the default, which keeps spoolr at `debug` and everything else
/// at `warn`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,spoolr=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test after [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    with_timeout_of(TEST_DEADLINE, f).await
}

/// Await `f`, failing the test after `limit`.
pub async fn with_timeout_of<F, T>(limit: Duration, f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, f).await {
        Ok(value) => value,
        Err(_) => panic!("test timed out after {limit:?}"),
    }
}

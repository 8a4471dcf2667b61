//! Shared helpers for `pipeshell` integration tests.

pub mod capture;
pub mod fixtures;
pub mod recorder;

use std::future::Future;
use std::sync::{Arc, Once};

use pipeshell::context::{ContextRegistry, ExecutionContext, TaskKey};
use tracing_subscriber::{EnvFilter, fmt};

pub use capture::{Capture, CollectingDiagnostics};
pub use fixtures::{TreeBuilder, sample_tree};
pub use recorder::Recorder;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Run `fut` as a fresh logical task whose current context is `ctx`, so
/// units and built-ins created inside it pick `ctx` up.
pub async fn in_context<F>(ctx: Arc<ExecutionContext>, fut: F) -> F::Output
where
    F: Future,
{
    let registry = ContextRegistry::global();
    let key = TaskKey::unique();
    registry.insert(key.clone(), ctx);
    registry.scope(key, fut).await
}

//! Shared helpers for the integration tests.

use tokio::time::Duration;

/// Route `tracing` output through the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Give follow-up casts (parent pointers, termination notices) time to land.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

//! Common test utilities for kiosk-store integration tests

pub mod mock_backend;

#[allow(unused_imports)]
pub use mock_backend::{MemoryBackend, MockAuth};

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

static TRACING: Once = Once::new();

/// Opt-in test logging: `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Poll an async condition until it holds or the timeout expires
///
/// Event-driven paths (profile provisioning, sign-out broadcasts) settle
/// on a spawned task; tests wait for the observable effect instead of
/// racing it.
#[allow(dead_code)]
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

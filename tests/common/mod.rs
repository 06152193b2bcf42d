//! Shared utilities for integration tests.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install a test subscriber once so persistence events show up under
/// `RUST_LOG=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

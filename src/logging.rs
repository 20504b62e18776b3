//! Logging setup for embedders and tests — this crate only ever emits
//! `tracing` events (see `src/attr.rs`'s fallback-view warning); it never
//! installs a subscriber itself, since a library shouldn't dictate where
//! its host's logs go. `init_test_logging` is the one exception: test
//! binaries have no other entry point to opt into seeing those events.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a `tracing-subscriber` `fmt` layer filtered by `RUST_LOG`
/// (default `warn`), once per process. Safe to call from every test that
/// wants log output on failure; later calls are no-ops.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

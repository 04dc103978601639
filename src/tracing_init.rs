//! Tracing bootstrap with environment-based filtering.
//!
//! `RUST_LOG` controls what is emitted, e.g.
//! `RUST_LOG=spectralyze::engine=debug` to watch the measurement loop or
//! `RUST_LOG=spectralyze::measure=trace` for per-tone window resolution.

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

/// Fallback filter for host applications.
const DEFAULT_FILTER: &str = "spectralyze=info";

/// Fallback filter for tests; the measurement loop is noisy below warn.
const DEFAULT_TEST_FILTER: &str = "spectralyze=warn";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Installs a test subscriber that captures output per test. Safe to call
/// from every test; only the first call installs.
pub fn init_test_tracing() {
    static INSTALL: Lazy<()> = Lazy::new(|| {
        fmt()
            .with_env_filter(env_filter(DEFAULT_TEST_FILTER))
            .with_target(true)
            .with_line_number(true)
            .with_test_writer()
            .init();
    });
    Lazy::force(&INSTALL);
}

/// Installs the subscriber for a host application. Call once, early in
/// main().
pub fn init_tracing() {
    fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();
}

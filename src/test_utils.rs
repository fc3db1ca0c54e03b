//! Test helpers: logging setup and structured test macros.
//!
//! Available to unit tests and, through the `test-internals` feature, to the
//! integration tests under `tests/`.

use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a `tracing` subscriber writing to the test harness output.
///
/// Honors `RUST_LOG`; defaults to `schedlab=debug`. Safe to call from every
/// test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("schedlab=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Marks the start of a test.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        ::tracing::info!(test = $name, "=== TEST START ===");
    };
}

/// Marks a named section inside a test.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        ::tracing::info!(section = $name, "--- section ---");
    };
}

/// Marks the successful end of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        ::tracing::info!(test = $name, "=== TEST PASSED ===");
    };
}

/// Asserts `cond`, logging expected and actual values before panicking.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        if !$cond {
            ::tracing::error!(
                message = $msg,
                expected = ?$expected,
                actual = ?$actual,
                "Assertion failed"
            );
        }
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

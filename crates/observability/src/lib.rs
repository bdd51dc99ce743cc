//! Tracing/logging setup shared by binaries and tests.

/// Initialize process-wide tracing with [`TracingConfig::from_env`].
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    self::tracing::init_with(&TracingConfig::from_env());
}

pub use self::tracing::{TracingConfig, init_for_tests, init_with};

/// Subscriber configuration and installation.
pub mod tracing;

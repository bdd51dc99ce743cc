//! Tracing subscriber configuration.
//!
//! JSON logs by default, filtered by `RUST_LOG` when set.

use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "STOWAGE_LOG_FORMAT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_filter: String,
    /// JSON lines when true, human-readable otherwise.
    pub json: bool,
    /// Include the event target (module path).
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: true,
            with_target: false,
        }
    }
}

impl TracingConfig {
    /// Defaults, with the format taken from `STOWAGE_LOG_FORMAT` if set.
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(format) => Self::default().with_format(&format),
            Err(_) => Self::default(),
        }
    }

    /// `pretty` switches to human-readable output; anything else keeps JSON.
    pub fn with_format(mut self, format: &str) -> Self {
        self.json = !format.trim().eq_ignore_ascii_case("pretty");
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Installs the global subscriber described by `config`.
///
/// Returns false when a subscriber was already installed; the existing one is
/// kept.
pub fn init_with(config: &TracingConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_target(config.with_target);

    let installed = if config.json {
        builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init()
    } else {
        builder.pretty().try_init()
    };

    installed.is_ok()
}

/// Human-readable output captured by the test harness, `debug` by default.
pub fn init_for_tests() {
    let config = TracingConfig {
        default_filter: "debug".to_string(),
        json: false,
        with_target: true,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_target(config.with_target)
        .with_test_writer()
        .try_init();
}

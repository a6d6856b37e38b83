//! Structured logging bootstrap on top of `tracing-subscriber`.
//!
//! Filter directives are read from `IMAGINIFY_LOG` using the usual
//! `EnvFilter` syntax (for example `imaginify=debug,iaccount=trace`). When the
//! variable is absent or malformed the filter falls back to `info`.

use tracing_subscriber::EnvFilter;

use crate::ImaginifyError;

pub const LOG_FILTER_ENV: &str = "IMAGINIFY_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs a global formatter writing to stderr. Call once at startup.
pub fn init_logging() -> Result<(), ImaginifyError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|err| {
            ImaginifyError::configuration(format!("failed to install log subscriber: {err}"))
        })?;

    tracing::debug!(filter_env = LOG_FILTER_ENV, "logging initialized");
    Ok(())
}

/// Console logging routed through the test writer. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

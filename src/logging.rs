//! Tracing initialisation for the `pyro` binary
//!
//! Logs always go to stderr; stdout carries command output and the
//! gateway protocol.

use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "PYRO_LOG";

const FALLBACK_FILTER: &str = "warn";

/// Build the filter from `PYRO_LOG`, then `log_level`, then the fallback
pub fn filter_for(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(settings: &Settings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(settings))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

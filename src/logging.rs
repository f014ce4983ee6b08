//! Structured logging setup.
//!
//! Events go to stderr so stdout stays free for the summary report.
//! `RUST_LOG`, when set, takes precedence over the configured level.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Builds the filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(level: &str) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(layer)
        .try_init();
}

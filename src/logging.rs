//! Tracing subscriber initialization.
//!
//! Structured logging via `tracing` and `tracing-subscriber`. The filter
//! comes from `RUST_LOG` when set, otherwise from the configured log level,
//! so a deployment can raise verbosity without editing `luxd.toml`.

use crate::error::{AcqError, AppResult};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `level` is any `tracing` filter directive ("info", "luxd=debug", ...).
/// Fails if a global subscriber is already set.
pub fn init(level: &str) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| AcqError::Configuration(format!("failed to init tracing: {err}")))
}

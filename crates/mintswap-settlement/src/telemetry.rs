//! `tracing` subscriber setup.

use mintswap_types::{MintswapError, Result, TelemetryConfig};
use tracing_subscriber::EnvFilter;

/// Parse a filter directive, rejecting anything malformed.
pub fn parse_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| MintswapError::Configuration(format!("log filter {directive:?}: {e}")))
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// filter. Fails if a global subscriber is already set.
pub fn init(config: &TelemetryConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.filter)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| MintswapError::Configuration(format!("tracing subscriber: {e}")))
}

//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;

/// Parse a log filter directive such as `info` or `apak_format=debug`.
pub fn parse_filter(filter: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(filter).map_err(|e| ConfigError::InvalidLogFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// Logs go to stderr so listings on stdout stay machine readable.
pub fn init(filter: &str, json: bool) -> Result<(), ConfigError> {
    let filter = parse_filter(filter)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

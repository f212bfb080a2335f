//! Tracing subscriber setup

use quill_shared::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::InfrastructureError;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
///
/// # Returns
/// * `Ok(true)` - Subscriber installed
/// * `Ok(false)` - A global subscriber was already installed
/// * `Err(InfrastructureError::Config)` - The level is not a valid filter
pub fn init_tracing(config: &LoggingConfig) -> Result<bool, InfrastructureError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    Ok(installed.is_ok())
}

pub(crate) fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, InfrastructureError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| {
            InfrastructureError::Config(format!("Invalid log filter '{}': {}", config.level, e))
        })
}

// Logging module for structured logging using the tracing crate

use std::error::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the tracing subscriber for structured logging
///
/// `RUST_LOG`, when set, takes precedence over the configured level. Output
/// goes to stderr so command output on stdout stays machine readable.
///
/// # Errors
///
/// Returns an error if the level is not a valid filter directive or a global
/// subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use forum_client::config::LoggingConfig;
/// use forum_client::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, Box<dyn Error + Send + Sync>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

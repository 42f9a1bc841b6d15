//! Logging configuration.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use super::ConfigError;

fn default_level() -> String {
    "info".to_string()
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human readable, for terminals
    Pretty,
}

/// Logging configuration (YAML format)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `forum_client=debug,reqwest=warn`
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.level).map_err(|e| ConfigError::InvalidValue {
            field: "logging.level".to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

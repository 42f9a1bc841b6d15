// Configuration module
//
// The only required setting is the API base URL. It can come from a YAML
// file (with ${VAR} substitution) or straight from FORUM_API_BASE_URL.

pub mod cache;
pub mod logging;

pub use cache::CacheSettings;
pub use logging::{LogFormat, LoggingConfig};

use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{BASE_URL_ENV_VAR, DEFAULT_LOGIN_PATH};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API base URL is required (set FORUM_API_BASE_URL or api_base_url)")]
    MissingBaseUrl,

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL every API path is resolved against
    pub api_base_url: String,
    /// Path of the login view (redirect target for 401s)
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Config with defaults for everything but the base URL
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            login_path: default_login_path(),
            cache: CacheSettings::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Build from the environment alone. A missing base URL is fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var(BASE_URL_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;
        let config = Self::new(base_url);
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| ConfigError::InvalidValue {
            field: "env_pattern".to_string(),
            reason: e.to_string(),
        })?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let config: ClientConfig = serde_yaml::from_str(&substituted)?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_with_env(&yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        self.base_url()?;

        if !self.login_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "login_path".to_string(),
                reason: format!("'{}' must start with /", self.login_path),
            });
        }

        self.cache.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Parsed base URL, normalized to end with a slash so relative API
    /// paths resolve beneath it.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        let url = Url::parse(&format!("{}/", trimmed)).map_err(|e| ConfigError::InvalidValue {
            field: "api_base_url".to_string(),
            reason: format!("'{}' is not a valid URL: {}", self.api_base_url, e),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(url)
    }
}

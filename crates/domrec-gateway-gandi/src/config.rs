//! Gateway configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.gandi.net/v5";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration error
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The personal access token is empty
    #[error("personal access token cannot be empty")]
    MissingToken,

    /// The base URL is empty
    #[error("base URL cannot be empty")]
    MissingBaseUrl,

    /// The request timeout is zero
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Configuration for the Gandi gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GandiConfig {
    /// Personal access token used for Bearer authentication.
    /// Never logged.
    pub personal_access_token: String,

    /// API base URL; override for test servers
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GandiConfig {
    /// Create a configuration with the production base URL and default
    /// timeout
    pub fn new(personal_access_token: impl Into<String>) -> Self {
        Self {
            personal_access_token: personal_access_token.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.personal_access_token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

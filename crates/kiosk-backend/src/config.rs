//! Backend configuration

use std::path::PathBuf;
use thiserror::Error;

/// Environment variable holding the backend base URL
pub const ENV_BACKEND_URL: &str = "KIOSK_BACKEND_URL";
/// Environment variable holding the publishable API key
pub const ENV_BACKEND_ANON_KEY: &str = "KIOSK_BACKEND_ANON_KEY";

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is missing or empty
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
}

/// Connection settings for the managed backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend project (no trailing slash)
    pub url: String,
    /// Publishable (anon) API key sent with every request
    pub anon_key: String,
    /// Where to persist the refresh token between runs; `None` disables
    /// session recovery
    pub session_file: Option<PathBuf>,
}

impl BackendConfig {
    /// Create a new backend config
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        Self {
            url,
            anon_key: anon_key.into(),
            session_file: None,
        }
    }

    /// Load the config from the environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(ENV_BACKEND_URL)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar(ENV_BACKEND_URL))?;
        let anon_key = std::env::var(ENV_BACKEND_ANON_KEY)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar(ENV_BACKEND_ANON_KEY))?;
        Ok(Self::new(url, anon_key))
    }

    /// Persist the refresh token at the given path
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// REST endpoint for a table
    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// Auth service endpoint
    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = BackendConfig::new("https://project.example.co/", "anon");
        assert_eq!(config.url, "https://project.example.co");
        assert_eq!(
            config.rest_url("plans"),
            "https://project.example.co/rest/v1/plans"
        );
        assert_eq!(
            config.auth_url("token"),
            "https://project.example.co/auth/v1/token"
        );
    }
}

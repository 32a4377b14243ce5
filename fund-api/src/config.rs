//! REST client configuration

use std::time::Duration;

use fund_core::config::{env_duration, env_opt, ConfigError};

/// Base URL used when `FUND_API_URL` is not set
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`ApiClient`](crate::ApiClient)
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Prefix for every endpoint, e.g. `https://api.example.com/api`
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `FUND_API_URL`, `FUND_API_TOKEN` and `FUND_API_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            base_url: env_opt("FUND_API_URL").unwrap_or(defaults.base_url),
            token: env_opt("FUND_API_TOKEN"),
            timeout: env_duration("FUND_API_TIMEOUT_SECS", defaults.timeout, Duration::from_secs)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let config = ApiConfig::default().with_token("super-secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("super-secret"));
    }
}

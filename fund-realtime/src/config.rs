//! Realtime client configuration

use std::time::Duration;

use fund_core::config::{env_duration, env_opt, env_or, ConfigError};
use url::Url;

use crate::error::RealtimeError;

/// Endpoint used when `FUND_WS_URL` is not set
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws";

/// Reconnect delay base
const RECONNECT_DELAY_BASE: Duration = Duration::from_secs(1);

/// Max reconnect attempts
const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Keep-alive ping interval
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Longest accepted ping interval
const MAX_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long `disconnect` waits for the connection task to close cleanly
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Query parameter carrying the credential
const TOKEN_PARAM: &str = "token";

/// Configuration for [`RealtimeClient`](crate::RealtimeClient)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// `ws://` or `wss://` endpoint
    pub endpoint: String,
    /// Delay before the first reconnect; doubles on every further attempt
    pub reconnect_base_delay: Duration,
    /// Retries after a drop before giving up
    pub max_reconnect_attempts: u32,
    pub heartbeat_interval: Duration,
    pub close_timeout: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect_base_delay: RECONNECT_DELAY_BASE,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            close_timeout: CLOSE_TIMEOUT,
        }
    }
}

impl RealtimeConfig {
    /// Load configuration from environment variables
    ///
    /// Reads:
    /// - `FUND_WS_URL`: endpoint
    /// - `FUND_WS_MAX_RECONNECTS`: retry budget
    /// - `FUND_WS_RECONNECT_BASE_MS`: first backoff delay
    /// - `FUND_WS_HEARTBEAT_SECS`: ping interval
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            endpoint: env_opt("FUND_WS_URL").unwrap_or(defaults.endpoint),
            reconnect_base_delay: env_duration(
                "FUND_WS_RECONNECT_BASE_MS",
                defaults.reconnect_base_delay,
                Duration::from_millis,
            )?,
            max_reconnect_attempts: env_or(
                "FUND_WS_MAX_RECONNECTS",
                defaults.max_reconnect_attempts,
            )?,
            heartbeat_interval: env_duration(
                "FUND_WS_HEARTBEAT_SECS",
                defaults.heartbeat_interval,
                Duration::from_secs,
            )?,
            close_timeout: defaults.close_timeout,
        };

        check_heartbeat(config.heartbeat_interval).map_err(|reason| ConfigError::InvalidValue {
            key: "FUND_WS_HEARTBEAT_SECS".to_string(),
            value: config.heartbeat_interval.as_secs().to_string(),
            reason,
        })?;
        Ok(config)
    }

    /// Reject settings the connection task cannot run with
    pub fn validate(&self) -> Result<(), RealtimeError> {
        check_heartbeat(self.heartbeat_interval).map_err(|reason| RealtimeError::InvalidConfig {
            field: "heartbeat_interval",
            reason,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Resolve the endpoint, appending the credential as `?token=`
    pub fn endpoint_url(&self, credential: Option<&str>) -> Result<Url, RealtimeError> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| RealtimeError::InvalidEndpoint {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(RealtimeError::InvalidEndpoint {
                url: self.endpoint.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }

        if let Some(token) = credential.filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair(TOKEN_PARAM, token);
        }

        Ok(url)
    }

    /// Delay before reconnect attempt `attempt` (1-based): `base * 2^(attempt-1)`
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.reconnect_base_delay.saturating_mul(factor)
    }
}

fn check_heartbeat(interval: Duration) -> Result<(), String> {
    if interval.is_zero() {
        return Err("heartbeat interval must be non-zero".to_string());
    }
    if interval > MAX_HEARTBEAT_INTERVAL {
        return Err(format!(
            "heartbeat interval must be at most {}s",
            MAX_HEARTBEAT_INTERVAL.as_secs()
        ));
    }
    Ok(())
}

//! Environment-driven configuration helpers

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{key} cannot be empty")]
    Empty { key: String },
}

/// Read `key` from the environment, falling back to `default` when unset
pub fn env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

/// Read an optional, non-empty string
pub fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a duration expressed in `unit` (e.g. milliseconds) from the environment
pub fn env_duration(
    key: &str,
    default: Duration,
    unit: fn(u64) -> Duration,
) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(raw) => parse_value::<u64>(key, &raw).map(unit),
        Err(_) => Ok(default),
    }
}

/// Parse a raw value, naming the key in the error
pub fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty {
            key: key.to_string(),
        });
    }
    trimmed.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Split a comma separated list, parsing every entry
pub fn parse_list<T>(key: &str, raw: &str) -> Result<Vec<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_value(key, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Topic;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u32>("N", " 7 ").unwrap(), 7);
        assert!(matches!(
            parse_value::<u32>("N", "seven"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_value::<u32>("N", "  "),
            Err(ConfigError::Empty { .. })
        ));
    }

    #[test]
    fn test_parse_topic_list() {
        let topics: Vec<Topic> = parse_list("FUND_TOPICS", "market-data, risk-alerts,,").unwrap();
        assert_eq!(topics, vec![Topic::MarketData, Topic::RiskAlerts]);
        assert!(parse_list::<Topic>("FUND_TOPICS", "market-data,weather").is_err());
    }

    #[test]
    fn test_env_or_default_when_unset() {
        let value: u32 = env_or("FUND_CORE_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}

//! Watcher configuration from the environment

use fund_api::ApiConfig;
use fund_core::config::{env_opt, env_or, parse_list, ConfigError};
use fund_core::Topic;
use fund_realtime::RealtimeConfig;

/// Everything the watcher reads at startup
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub realtime: RealtimeConfig,
    pub api: ApiConfig,
    /// Topics to subscribe to (`FUND_TOPICS`, default all)
    pub topics: Vec<Topic>,
    /// Minimum confidence for a prediction to be logged at info (`FUND_MIN_CONFIDENCE`)
    pub min_confidence: f64,
}

impl WatchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let topics = match env_opt("FUND_TOPICS") {
            Some(raw) => parse_list("FUND_TOPICS", &raw)?,
            None => Topic::ALL.to_vec(),
        };

        let min_confidence: f64 = env_or("FUND_MIN_CONFIDENCE", 0.7)?;
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(ConfigError::InvalidValue {
                key: "FUND_MIN_CONFIDENCE".to_string(),
                value: min_confidence.to_string(),
                reason: "must be between 0 and 1".to_string(),
            });
        }

        Ok(Self {
            realtime: RealtimeConfig::from_env()?,
            api: ApiConfig::from_env()?,
            topics,
            min_confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the environment is not raced by sibling tests
    #[test]
    fn test_from_env_topics_and_confidence() {
        std::env::set_var("FUND_TOPICS", "risk_alerts, MARKET-DATA");
        std::env::set_var("FUND_MIN_CONFIDENCE", "0.9");
        let config = WatchConfig::from_env().unwrap();
        assert_eq!(config.topics, vec![Topic::RiskAlerts, Topic::MarketData]);
        assert_eq!(config.min_confidence, 0.9);

        std::env::set_var("FUND_MIN_CONFIDENCE", "1.5");
        assert!(WatchConfig::from_env().is_err());

        std::env::set_var("FUND_MIN_CONFIDENCE", "0.5");
        std::env::set_var("FUND_TOPICS", "market-data,weather");
        assert!(WatchConfig::from_env().is_err());

        std::env::remove_var("FUND_TOPICS");
        std::env::remove_var("FUND_MIN_CONFIDENCE");
        assert_eq!(WatchConfig::from_env().unwrap().topics, Topic::ALL.to_vec());
    }
}

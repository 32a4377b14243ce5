//! Realtime message types
//!
//! These types define the protocol spoken between the realtime client and
//! the platform's WebSocket endpoint: the topic names, the outbound control
//! messages, the inbound envelope and the payload carried on each topic.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::FundError;

// ============================================================================
// Topics
// ============================================================================

/// Named channels a client can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    /// NAV / price ticks for funds
    MarketData,
    /// Changes to the signed-in user's portfolio
    PortfolioUpdates,
    /// Buy/sell/hold signals from the prediction models
    MlPredictions,
    /// Risk alerts with a severity and recommendation
    RiskAlerts,
    /// Account-level events (logins, payment status, ...)
    UserEvents,
}

impl Topic {
    /// Every topic, in wire order
    pub const ALL: [Topic; 5] = [
        Topic::MarketData,
        Topic::PortfolioUpdates,
        Topic::MlPredictions,
        Topic::RiskAlerts,
        Topic::UserEvents,
    ];

    /// Wire name of the topic
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::MarketData => "market-data",
            Topic::PortfolioUpdates => "portfolio-updates",
            Topic::MlPredictions => "ml-predictions",
            Topic::RiskAlerts => "risk-alerts",
            Topic::UserEvents => "user-events",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "market-data" => Ok(Topic::MarketData),
            "portfolio-updates" => Ok(Topic::PortfolioUpdates),
            "ml-predictions" => Ok(Topic::MlPredictions),
            "risk-alerts" => Ok(Topic::RiskAlerts),
            "user-events" => Ok(Topic::UserEvents),
            _ => Err(format!("Unknown topic: {}", s)),
        }
    }
}

// ============================================================================
// Client -> Server Messages
// ============================================================================

/// Control messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Start receiving messages for the given topics
    Subscribe { topics: Vec<Topic> },
    /// Stop receiving messages for the given topics
    Unsubscribe { topics: Vec<Topic> },
    /// Keep-alive
    Ping,
}

impl ControlMessage {
    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Subscribe { .. } => "subscribe",
            ControlMessage::Unsubscribe { .. } => "unsubscribe",
            ControlMessage::Ping => "ping",
        }
    }
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

/// Envelope of every message pushed by the server
///
/// `kind` is usually a [`Topic`] wire name; the server may also send
/// housekeeping frames (`pong`, `subscribed`, `error`) which carry no topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub payload: Value,

    /// Server timestamp, if one was sent and could be read
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl InboundMessage {
    /// Build a message for a topic (mostly useful for servers and tests)
    pub fn new(topic: Topic, payload: Value) -> Self {
        Self {
            kind: topic.as_str().to_string(),
            payload,
            timestamp: Some(Utc::now()),
        }
    }

    /// Parse a raw text frame
    pub fn from_json(text: &str) -> Result<Self, FundError> {
        serde_json::from_str(text)
            .map_err(|e| FundError::parse(format!("Invalid realtime message: {}", e)))
    }

    /// Topic this message belongs to, if `kind` names one
    pub fn topic(&self) -> Option<Topic> {
        self.kind.parse().ok()
    }

    /// Decode the payload into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, FundError> {
        T::deserialize(&self.payload).map_err(|e| {
            FundError::parse(format!("Invalid {} payload: {}", self.kind, e))
        })
    }
}

/// Accepts RFC 3339 strings and Unix epoch seconds or milliseconds.
/// Unreadable values become `None` rather than failing the whole message.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

/// Read a timestamp in any of the formats the server is known to send
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<i64>().ok().and_then(from_epoch)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch),
        _ => None,
    }
}

fn from_epoch(ts: i64) -> Option<DateTime<Utc>> {
    // Anything past year 2286 in seconds is really milliseconds
    if ts > 10_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}

// ============================================================================
// Topic payloads
// ============================================================================

/// Price tick on `market-data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketTick {
    pub fund_id: String,
    pub nav: Decimal,
    #[serde(default)]
    pub change: Decimal,
    #[serde(default)]
    pub change_percent: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

/// Portfolio delta on `portfolio-updates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDelta {
    pub portfolio_id: String,
    pub total_value: Decimal,
    #[serde(default)]
    pub day_change: Decimal,
    #[serde(default)]
    pub day_change_percent: Decimal,
    #[serde(default)]
    pub holdings: Vec<HoldingDelta>,
}

/// One changed holding inside a [`PortfolioDelta`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingDelta {
    pub fund_id: String,
    pub units: Decimal,
    pub current_value: Decimal,
}

/// Model recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Prediction on `ml-predictions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub fund_id: String,
    pub signal: Signal,
    /// Model confidence in 0.0..=1.0
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_nav: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ModelPrediction {
    /// Whether the model is at least `threshold` sure of the signal
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

/// Alert severity, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Alert on `risk-alerts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_id: Option<String>,
    pub severity: Severity,
    #[serde(default)]
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Event on `user-events`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub data: Value,
}

// ============================================================================
// Connection status
// ============================================================================

/// Status of the realtime connection as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Transport open, messages flowing
    Connected,
    /// Transport being opened
    Connecting,
    /// No transport (waiting to retry, given up, or never started)
    #[default]
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Disconnected => "disconnected",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_topic_wire_names() {
        for topic in Topic::ALL {
            let json = serde_json::to_string(&topic).unwrap();
            assert_eq!(json, format!("\"{}\"", topic.as_str()));
            assert_eq!(topic.as_str().parse::<Topic>().unwrap(), topic);
        }
        assert_eq!("RISK_ALERTS".parse::<Topic>().unwrap(), Topic::RiskAlerts);
        assert!("pong".parse::<Topic>().is_err());
    }

    #[test]
    fn test_control_message_shape() {
        let msg = ControlMessage::Subscribe {
            topics: vec![Topic::MarketData, Topic::RiskAlerts],
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "subscribe", "topics": ["market-data", "risk-alerts"]})
        );
        assert_eq!(
            serde_json::to_value(ControlMessage::Ping).unwrap(),
            json!({"type": "ping"})
        );
    }

    #[test]
    fn test_inbound_timestamp_formats() {
        let rfc = InboundMessage::from_json(
            r#"{"type":"market-data","payload":{},"timestamp":"2024-03-01T09:15:00Z"}"#,
        )
        .unwrap();
        let millis = InboundMessage::from_json(
            r#"{"type":"market-data","payload":{},"timestamp":1709284500000}"#,
        )
        .unwrap();
        let secs = InboundMessage::from_json(
            r#"{"type":"market-data","payload":{},"timestamp":1709284500}"#,
        )
        .unwrap();
        assert!(rfc.timestamp.is_some());
        assert_eq!(rfc.timestamp, millis.timestamp);
        assert_eq!(rfc.timestamp, secs.timestamp);

        let garbage = InboundMessage::from_json(
            r#"{"type":"market-data","payload":{},"timestamp":"yesterday"}"#,
        )
        .unwrap();
        assert!(garbage.timestamp.is_none());

        let bare = InboundMessage::from_json(r#"{"type":"pong"}"#).unwrap();
        assert_eq!(bare.payload, Value::Null);
        assert!(bare.topic().is_none());
    }

    #[test]
    fn test_inbound_requires_type() {
        assert!(InboundMessage::from_json(r#"{"payload":{}}"#).is_err());
        assert!(InboundMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_decode_payloads() {
        let msg = InboundMessage::new(
            Topic::MarketData,
            json!({"fund_id": "HDFC-TOP100", "nav": "812.45", "change": 3.1, "change_percent": 0.38}),
        );
        let tick: MarketTick = msg.decode().unwrap();
        assert_eq!(tick.nav, dec!(812.45));
        assert_eq!(tick.change, dec!(3.1));

        let alert = InboundMessage::new(
            Topic::RiskAlerts,
            json!({"severity": "HIGH", "message": "Drawdown above 8%", "recommendation": "Rebalance"}),
        );
        let alert: RiskAlert = alert.decode().unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert!(alert.severity > Severity::Medium);

        let bad = InboundMessage::new(Topic::MlPredictions, json!({"signal": "MAYBE"}));
        assert!(matches!(
            bad.decode::<ModelPrediction>(),
            Err(FundError::Parse(_))
        ));
    }
}

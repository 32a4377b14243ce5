//! Realtime pub/sub client for the Fund Terminal
//!
//! Holds one WebSocket connection to the platform, multiplexes the named
//! [`Topic`](fund_core::Topic)s over it, fans inbound messages out to
//! per-topic handlers and reconnects with exponential backoff when the
//! connection drops.
//!
//! ```no_run
//! use fund_core::{RiskAlert, Topic};
//! use fund_realtime::{RealtimeClient, RealtimeConfig};
//!
//! # async fn run() -> Result<(), fund_realtime::RealtimeError> {
//! let client = RealtimeClient::new(RealtimeConfig::default());
//! let _alerts = client.on_risk_alert(|alert: RiskAlert| {
//!     println!("{:?}: {}", alert.severity, alert.message);
//! });
//! client.subscribe([Topic::RiskAlerts]);
//! client.connect(Some("session-token"))?;
//! // ...
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod transport;
pub mod ws;

pub use client::RealtimeClient;
pub use config::RealtimeConfig;
pub use error::RealtimeError;
pub use handlers::{HandlerHandle, HandlerRegistry};
pub use transport::{Connector, Frame, Transport};
pub use ws::{WsConnector, WsTransport};

//! Errors raised by the realtime client

use thiserror::Error;

/// Realtime client errors
///
/// Only [`RealtimeError::InvalidEndpoint`] and
/// [`RealtimeError::InvalidConfig`] reach callers of
/// [`connect`](crate::RealtimeClient::connect); everything else is logged
/// by the connection task and answered with a reconnect.
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("Invalid endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Connection closed")]
    Closed,
}

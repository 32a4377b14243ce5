//! Transport seam between the client and the wire
//!
//! The client only needs to open a connection, send text, read the next
//! frame and close. [`WsConnector`](crate::WsConnector) does this over
//! tokio-tungstenite; tests plug in an in-memory pair.

use async_trait::async_trait;
use url::Url;

use crate::error::RealtimeError;

/// A frame the client cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text payload (one JSON envelope)
    Text(String),
    /// Peer closed the connection
    Close {
        code: Option<u16>,
        reason: String,
    },
}

/// Opens transports
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    async fn connect(&self, url: &Url) -> Result<Self::Transport, RealtimeError>;
}

/// An open, bidirectional text connection
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send one text frame
    async fn send(&mut self, text: String) -> Result<(), RealtimeError>;

    /// Next frame from the peer; `None` once the stream has ended
    async fn next_frame(&mut self) -> Option<Result<Frame, RealtimeError>>;

    /// Close with the normal-closure code
    async fn close(&mut self) -> Result<(), RealtimeError>;
}

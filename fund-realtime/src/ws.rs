//! tokio-tungstenite transport

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use crate::error::RealtimeError;
use crate::transport::{Connector, Frame, Transport};

/// Opens real WebSocket connections
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, url: &Url) -> Result<WsTransport, RealtimeError> {
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| RealtimeError::Connect(e.to_string()))?;

        debug!("[Realtime] Handshake complete ({})", response.status());
        Ok(WsTransport { stream })
    }
}

/// An open WebSocket
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), RealtimeError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| RealtimeError::Transport(e.to_string()))
    }

    async fn next_frame(&mut self) -> Option<Result<Frame, RealtimeError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Some(Ok(Frame::Text(text))),
                    Err(_) => debug!("[Realtime] Skipping non UTF-8 binary frame"),
                },
                Ok(Message::Ping(data)) => {
                    // Respond to ping
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        return Some(Err(RealtimeError::Transport(e.to_string())));
                    }
                }
                Ok(Message::Close(frame)) => {
                    return Some(Ok(Frame::Close {
                        code: frame.as_ref().map(|f| u16::from(f.code)),
                        reason: frame.map(|f| f.reason.as_str().to_owned()).unwrap_or_default(),
                    }));
                }
                Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => return Some(Err(RealtimeError::Transport(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<(), RealtimeError> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "client disconnect".into(),
        };
        self.stream
            .close(Some(frame))
            .await
            .map_err(|e| RealtimeError::Transport(e.to_string()))
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport").finish_non_exhaustive()
    }
}

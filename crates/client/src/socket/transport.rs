//! Transport seam for the notification socket.
//!
//! [`ReconnectingSocket`](super::ReconnectingSocket) only talks to the
//! [`Connector`] and [`Connection`] traits, so the reconnection logic can be
//! driven by an in-memory fake in tests. [`TungsteniteConnector`] is the real
//! WebSocket implementation.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

/// Errors raised by the notification socket.
#[derive(Debug, Error)]
pub enum SocketError {
    /// The connection could not be established.
    #[error("failed to connect: {0}")]
    Connect(#[source] Box<WsError>),

    /// A live connection failed while reading or writing.
    #[error("socket transport error: {0}")]
    Transport(#[source] Box<WsError>),

    /// An outbound payload could not be serialised.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Close frame details reported by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// WebSocket close code.
    pub code: u16,
    /// Human-readable reason, possibly empty.
    pub reason: String,
}

/// Frames surfaced to the socket runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text message.
    Text(String),
    /// The peer closed the connection.
    Closed(Option<CloseInfo>),
}

/// One established duplex connection.
#[async_trait]
pub trait Connection: Send {
    /// Wait for the next inbound frame. `None` means the stream ended.
    ///
    /// Must be cancel-safe: the runtime polls it inside `tokio::select!`.
    async fn recv(&mut self) -> Option<Result<Inbound, SocketError>>;

    /// Transmit one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), SocketError>;

    /// Close the connection, ignoring failures.
    async fn close(&mut self);
}

/// Factory for [`Connection`]s.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `url`.
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, SocketError>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>, SocketError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| SocketError::Connect(Box::new(e)))?;
        Ok(Box::new(TungsteniteConnection { stream }))
    }
}

struct TungsteniteConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for TungsteniteConnection {
    async fn recv(&mut self) -> Option<Result<Inbound, SocketError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                    return Some(Ok(Inbound::Closed(None)));
                }
                Err(e) => return Some(Err(SocketError::Transport(Box::new(e)))),
            };

            match message {
                Message::Text(text) => return Some(Ok(Inbound::Text(text.to_string()))),
                Message::Close(frame) => {
                    let info = frame.map(|f| CloseInfo {
                        code: u16::from(f.code),
                        reason: f.reason.to_string(),
                    });
                    return Some(Ok(Inbound::Closed(info)));
                }
                Message::Binary(bytes) => {
                    debug!(len = bytes.len(), "Skipping binary socket frame");
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), SocketError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| SocketError::Transport(Box::new(e)))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Socket close handshake failed");
        }
    }
}

//! Message transport seam: ordered, bidirectional, one text message per call.
//! `WsTransport` adapts a tokio-tungstenite `WebSocketStream`; tests plug in an in-memory implementation.

mod websocket;

pub use websocket::WsTransport;

use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Peer closed the connection. Expected at the end of every session.
    #[error("connection closed by peer")]
    Closed,

    /// Frame that cannot be read as text
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("transport I/O error: {0}")]
    Io(String),
}

impl TransportError {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// One client connection.
pub trait Transport: Send {
    /// Sends a single text message.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Waits for the next text message. Must be cancel-safe: the session races it against its pacing timer.
    fn recv_text(&mut self) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// Server-side close after a terminal error message. Failures are ignored.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

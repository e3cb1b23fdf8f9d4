use crate::protocol::{OutboundMessage, StreamSelection};
use crate::source::StreamDescriptor;
use crate::utils::{ConnectionHandle, OrError};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::fmt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Sample batch as received by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    pub timestamps: Vec<f64>,
    pub data: Vec<Vec<f64>>,
    pub selected_channels: Vec<String>,
}

/// Client side of the relay handshake: `streams()` → `select()` → `next_frame()` repeatedly.
pub struct RelayClient {
    ws_write: WsSink,
    ws_read: WsStream,
}

impl fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayClient").finish()
    }
}

impl RelayClient {
    pub async fn connect(server: ConnectionHandle) -> OrError<Self> {
        let url = server.ws_url();
        let (ws_stream, _) = connect_async(&url)
            .await
            .map_err(|e| format!("Hermes RelayClient creation error: failed to connect to {}: {}", url, e))?;
        let (ws_write, ws_read) = ws_stream.split();
        Ok(Self { ws_write, ws_read })
    }

    /// Next message from the server. `None` once the server closes.
    pub async fn next_message(&mut self) -> OrError<Option<OutboundMessage>> {
        while let Some(msg) = self.ws_read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let message = OutboundMessage::from_text(text.as_str())
                        .map_err(|e| format!("Failed to parse server message: {}", e))?;
                    return Ok(Some(message));
                }
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => continue,
                Err(e) => return Err(format!("WebSocket error: {}", e)),
            }
        }
        Ok(None)
    }

    /// Reads the stream advertisement. A server error message becomes `Err` carrying its text.
    pub async fn streams(&mut self) -> OrError<Vec<StreamDescriptor>> {
        match self.next_message().await? {
            Some(OutboundMessage::Streams { streams }) => Ok(streams),
            Some(OutboundMessage::Error { error }) => Err(error),
            Some(other) => Err(format!("Expected stream list, got {:?}", other)),
            None => Err("Connection closed".to_string()),
        }
    }

    /// Sends the selection and returns the advertised channel list.
    pub async fn select(&mut self, stream_name: &str) -> OrError<Vec<String>> {
        let text = StreamSelection::new(stream_name)
            .to_text()
            .map_err(|e| format!("Failed to encode selection: {}", e))?;
        self.send_raw(&text).await?;
        match self.next_message().await? {
            Some(OutboundMessage::Channels { channels }) => Ok(channels),
            Some(OutboundMessage::Error { error }) => Err(error),
            Some(other) => Err(format!("Expected channel list, got {:?}", other)),
            None => Err("Connection closed".to_string()),
        }
    }

    /// Sends arbitrary text, e.g. a malformed selection.
    pub async fn send_raw(&mut self, text: &str) -> OrError<()> {
        self.ws_write
            .send(Message::Text(text.to_string().into()))
            .await
            .map_err(|e| format!("Failed to send message: {}", e))
    }

    /// Next sample batch. `None` once the server closes.
    pub async fn next_frame(&mut self) -> OrError<Option<SampleFrame>> {
        match self.next_message().await? {
            Some(OutboundMessage::Samples {
                timestamps,
                data,
                selected_channels,
            }) => Ok(Some(SampleFrame {
                timestamps,
                data,
                selected_channels,
            })),
            Some(OutboundMessage::Error { error }) => Err(error),
            Some(other) => Err(format!("Expected sample batch, got {:?}", other)),
            None => Ok(None),
        }
    }

    pub async fn close(mut self) -> OrError<()> {
        self.ws_write
            .close()
            .await
            .map_err(|e| format!("Failed to close connection: {}", e))
    }
}

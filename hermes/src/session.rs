//! One client session from handshake to teardown: advertise streams, take a selection, connect,
//! advertise channels, then pull a batch and push it to the client once per cadence interval until the peer closes.

mod cadence;
mod guard;
mod state;

pub use cadence::stream_interval;
pub use guard::ConnectionGuard;
pub use state::SessionState;

use crate::config::SessionSettings;
use crate::constants::{CONNECT_FAILED_MESSAGE, INVALID_STREAM_NAME_MESSAGE, NO_STREAMS_MESSAGE};
use crate::protocol::{OutboundMessage, StreamSelection};
use crate::source::{BatchDefect, SampleBatch, SourceConnection, StreamSource};
use crate::transport::{Transport, TransportError};
use futures_util::FutureExt;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How a session ended without an internal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Discovery found nothing; the client got an error message
    NoStreams,
    /// Selection was missing or blank; the client got an error message
    InvalidSelection,
    /// The source refused the selected stream; the client got an error message
    ConnectFailed,
    /// The client closed the connection
    PeerClosed,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoStreams => "no streams available",
            Self::InvalidSelection => "invalid stream selection",
            Self::ConnectFailed => "failed to connect to stream",
            Self::PeerClosed => "closed by peer",
        };
        f.write_str(reason)
    }
}

/// Internal failures. These end the session but never reach the listener.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("illegal session transition {from} -> {to}")]
    IllegalTransition { from: SessionState, to: SessionState },

    /// Empty-read policy exhausted
    #[error("source produced {reads} consecutive empty reads (last: {last})")]
    SourceStalled { reads: u32, last: BatchDefect },

    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub batches_sent: u64,
    pub rows_sent: u64,
    pub empty_reads: u64,
}

/// What `Session::run` hands back: how the session ended plus what it did.
#[derive(Debug)]
pub struct SessionReport {
    pub outcome: Result<SessionEnd, SessionError>,
    pub state: SessionState,
    pub stats: SessionStats,
}

/// Live state of one client session. Owns its transport and, once connected, its source connection.
/// Dropping the session releases the connection, so every exit path disconnects exactly once.
pub struct Session<'a, S: StreamSource, T: Transport> {
    source: &'a S,
    transport: T,
    settings: SessionSettings,
    state: SessionState,
    stream_name: Option<String>,
    connection: Option<ConnectionGuard<S::Connection>>,
    channels: Vec<String>,
    interval: Duration,
    stats: SessionStats,
}

impl<'a, S: StreamSource, T: Transport> Session<'a, S, T> {
    pub fn new(source: &'a S, transport: T, settings: SessionSettings) -> Self {
        Self {
            source,
            transport,
            settings,
            state: SessionState::AwaitingHandshake,
            stream_name: None,
            connection: None,
            channels: Vec::new(),
            interval: Duration::ZERO,
            stats: SessionStats::default(),
        }
    }

    /// Drives the session to completion. A peer close anywhere is reported as `SessionEnd::PeerClosed`.
    /// The source connection is already released when the report comes back.
    /// Called by: `RelayServer` connection tasks
    pub async fn run(mut self) -> SessionReport {
        let outcome = match self.drive().await {
            Err(SessionError::Transport(TransportError::Closed)) => Ok(SessionEnd::PeerClosed),
            other => other,
        };
        self.release();
        info!(
            stream = self.stream_name.as_deref().unwrap_or("-"),
            batches = self.stats.batches_sent,
            rows = self.stats.rows_sent,
            empty_reads = self.stats.empty_reads,
            "session finished"
        );
        SessionReport {
            outcome,
            state: self.state,
            stats: self.stats,
        }
    }

    async fn drive(&mut self) -> Result<SessionEnd, SessionError> {
        // Discover
        let streams = self.source.find_streams();
        if streams.is_empty() {
            warn!("no streams found");
            return self.reject(SessionEnd::NoStreams, NO_STREAMS_MESSAGE).await;
        }
        info!(count = streams.len(), "advertising streams");
        self.send(&OutboundMessage::streams(streams)).await?;
        self.advance(SessionState::StreamsSent)?;

        // Select
        self.advance(SessionState::AwaitingSelection)?;
        let reply = self.transport.recv_text().await?;
        let Some(selection) = StreamSelection::parse(&reply) else {
            warn!(reply = %truncate(&reply, 128), "invalid stream name received");
            return self.reject(SessionEnd::InvalidSelection, INVALID_STREAM_NAME_MESSAGE).await;
        };
        self.stream_name = Some(selection.stream_name.clone());

        // Connect
        let connection = match self.source.connect(&selection.stream_name, self.settings.buffer_size) {
            Ok(connection) => ConnectionGuard::new(connection),
            Err(e) => {
                warn!(stream = %selection.stream_name, error = %e, "failed to connect to stream");
                return self.reject(SessionEnd::ConnectFailed, CONNECT_FAILED_MESSAGE).await;
            }
        };
        self.channels = connection.channel_names().to_vec();
        self.interval = stream_interval(self.settings.buffer_size, connection.sample_rate());
        self.connection = Some(connection);
        self.advance(SessionState::Connected)?;
        info!(
            stream = %selection.stream_name,
            channels = self.channels.len(),
            interval_ms = self.interval.as_millis() as u64,
            "connected to stream"
        );

        // Advertise channels
        self.send(&OutboundMessage::channels(&self.channels)).await?;
        self.advance(SessionState::ChannelsSent)?;

        self.stream().await
    }

    // Pull → validate → push → pace. Only leaves through an error (peer close included).
    async fn stream(&mut self) -> Result<SessionEnd, SessionError> {
        self.advance(SessionState::Streaming)?;
        info!("streaming to client");
        let mut consecutive_empty: u32 = 0;
        loop {
            match self.pull() {
                Ok(batch) => {
                    consecutive_empty = 0;
                    let rows = batch.len() as u64;
                    self.send(&OutboundMessage::samples(batch, &self.channels)).await?;
                    self.stats.batches_sent += 1;
                    self.stats.rows_sent += rows;
                    debug!(rows, "sent batch");
                    self.suspend(self.interval).await?;
                }
                Err(defect) => {
                    consecutive_empty = consecutive_empty.saturating_add(1);
                    self.stats.empty_reads += 1;
                    if consecutive_empty == 1 {
                        warn!(reason = %defect, "no valid data received from stream");
                    } else {
                        debug!(reason = %defect, consecutive = consecutive_empty, "empty read");
                    }
                    if self.settings.empty_reads.is_exhausted(consecutive_empty) {
                        return Err(SessionError::SourceStalled {
                            reads: consecutive_empty,
                            last: defect,
                        });
                    }
                    self.suspend(self.settings.empty_reads.backoff).await?;
                }
            }
        }
    }

    fn pull(&mut self) -> Result<SampleBatch, BatchDefect> {
        let window = self.settings.window_secs;
        let batch = self
            .connection
            .as_mut()
            .and_then(|connection| connection.get_data(window, &self.channels))
            .ok_or(BatchDefect::Missing)?;
        batch.validate(self.channels.len())?;
        Ok(batch)
    }

    // Waits out `duration` while watching the inbound side, so a close during the pause ends the session.
    // A zero pause yields once and only checks for an already-pending close.
    async fn suspend(&mut self, duration: Duration) -> Result<(), TransportError> {
        if duration.is_zero() {
            tokio::task::yield_now().await;
            if let Some(inbound) = self.transport.recv_text().now_or_never() {
                Self::ignore_inbound(inbound?);
            }
            return Ok(());
        }
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => return Ok(()),
                inbound = self.transport.recv_text() => Self::ignore_inbound(inbound?),
            }
        }
    }

    fn ignore_inbound(text: String) {
        debug!(reply = %truncate(&text, 128), "ignoring client message while streaming");
    }

    async fn send(&mut self, message: &OutboundMessage) -> Result<(), SessionError> {
        let text = message.to_text()?;
        self.transport.send_text(text).await?;
        Ok(())
    }

    // Sends the terminal error message, closes the transport and reports `end`.
    async fn reject(&mut self, end: SessionEnd, message: &str) -> Result<SessionEnd, SessionError> {
        self.send(&OutboundMessage::error(message)).await?;
        self.transport.close().await;
        Ok(end)
    }

    fn advance(&mut self, next: SessionState) -> Result<(), SessionError> {
        if !self.state.can_advance_to(next) {
            return Err(SessionError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(from = %self.state, to = %next, "session state");
        self.state = next;
        Ok(())
    }

    fn release(&mut self) {
        // Dropping the guard disconnects the source
        self.connection = None;
        if !self.state.is_terminal() {
            self.state = SessionState::Closed;
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

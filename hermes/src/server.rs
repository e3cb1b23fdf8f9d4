//! TCP WebSocket listener hosting one independent `Session` per accepted client.
//! Sessions share only the immutable `StreamSource`; each owns its transport and source connection.

use crate::config::{RelayConfig, SessionSettings};
use crate::session::{Session, SessionEnd, SessionError, SessionReport};
use crate::source::StreamSource;
use crate::transport::WsTransport;
use crate::utils::{ConnectionHandle, OrError};
use crate::hermes_error_cause;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tracing::{Instrument, error, info, info_span, warn};

/// WebSocket relay server. Binds on construction and serves until dropped.
pub struct RelayServer {
    connection: ConnectionHandle,
    task_handle: JoinHandle<()>,
}

impl RelayServer {
    /// Binds the listener and spawns the accept loop.
    /// Network: every accepted TCP stream is upgraded to WebSocket and served by its own task.
    /// Error: invalid config or bind failure → propagates to caller. Session failures are logged per connection.
    /// Called by: `relayserver` binary, integration tests
    pub async fn new<S: StreamSource>(config: RelayConfig, source: Arc<S>) -> OrError<Self> {
        config.validate()?;
        let bind = config.bind_handle()?;
        let listener = TcpListener::bind(bind.socket_addr()).await.map_err(|e| {
            hermes_error_cause!(
                "server::RelayServer",
                "new",
                &format!("failed to bind {}", bind),
                e
            )
        })?;
        let local = listener.local_addr().map_err(|e| {
            hermes_error_cause!("server::RelayServer", "new", "failed to read bound address", e)
        })?;
        let connection = ConnectionHandle::from(local);

        info!(addr = %connection, "relay server listening");

        let settings = config.session;
        // Accept loop: spawn per-connection session tasks
        let task_handle = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((tcp_stream, peer)) => {
                        let source = source.clone();
                        tokio::spawn(
                            serve_connection(tcp_stream, peer, source, settings)
                                .instrument(info_span!("session", %peer)),
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                    }
                }
            }
        });

        Ok(Self {
            connection,
            task_handle,
        })
    }

    /// Address the listener is actually bound to (resolves port 0).
    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}

async fn serve_connection<S: StreamSource>(
    tcp_stream: TcpStream,
    peer: SocketAddr,
    source: Arc<S>,
    settings: SessionSettings,
) {
    info!("new client connected");
    let outcome = run_connection(tcp_stream, source.as_ref(), settings)
        .await
        .and_then(|report| report.outcome);
    match outcome {
        Ok(SessionEnd::PeerClosed) => warn!("connection closed"),
        Ok(end) => info!(outcome = %end, "session ended"),
        Err(e) => error!(%peer, error = %e, "session failed"),
    }
}

async fn run_connection<S: StreamSource>(
    tcp_stream: TcpStream,
    source: &S,
    settings: SessionSettings,
) -> Result<SessionReport, SessionError> {
    let ws_stream = accept_async(tcp_stream)
        .await
        .map_err(|e| SessionError::Handshake(e.to_string()))?;
    Ok(Session::new(source, WsTransport::new(ws_stream), settings).run().await)
}

pub mod client;
pub mod config;
pub mod constants;
pub mod protocol;
pub mod server;
pub mod session;
pub mod source;
pub mod transport;
pub mod utils;

// Re-export core types at the top level for easy access
pub use client::{RelayClient, SampleFrame};
pub use config::{EmptyReadPolicy, RelayConfig, SessionSettings};
pub use protocol::{OutboundMessage, StreamSelection};
pub use server::RelayServer;
pub use session::{Session, SessionEnd, SessionError, SessionReport, SessionState, SessionStats};
pub use source::{SampleBatch, SimulatedSource, SourceConnection, StreamDescriptor, StreamSource};
pub use transport::{Transport, TransportError, WsTransport};
pub use utils::ConnectionHandle;

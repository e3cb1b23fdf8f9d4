//! Stream source seam: discovery of named EEG streams and pull-style sample reads.
//! `StreamSource` enumerates and connects; `SourceConnection` exposes channels, nominal rate and `get_data`.

mod batch;
mod simulator;

pub use batch::{BatchDefect, SampleBatch};
pub use simulator::{SimulatedConnection, SimulatedSource, SimulatedStream};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stream advertised by discovery. Only the name crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct StreamDescriptor {
    #[new(into)]
    pub name: String,
}

/// Source errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// No stream with this name is currently available
    #[error("Unknown stream: {0}")]
    UnknownStream(String),

    /// Buffer size must hold at least one sample
    #[error("Invalid buffer size: {0}")]
    InvalidBufferSize(usize),

    /// Stream exists but refused or dropped the connection
    #[error("Stream unavailable: {0}")]
    Unavailable(String),
}

/// Discovers streams and opens exclusive connections to them.
/// Shared across sessions behind an `Arc`; every `connect` returns a connection owned by one session.
pub trait StreamSource: Send + Sync + 'static {
    type Connection: SourceConnection;

    /// Streams available right now. May be empty; order is not guaranteed.
    fn find_streams(&self) -> Vec<StreamDescriptor>;

    /// Opens a connection to `stream_name` holding at most `buffer_size` samples.
    fn connect(&self, stream_name: &str, buffer_size: usize) -> Result<Self::Connection, SourceError>;
}

/// An open connection to one stream.
pub trait SourceConnection: Send {
    /// Channel labels, in the column order of every batch.
    fn channel_names(&self) -> &[String];

    /// Nominal sample rate in Hz. `0.0` means irregular or unknown.
    fn sample_rate(&self) -> f64;

    /// Most recent `window_secs` of samples restricted to `picks` (all channels when empty).
    /// Returns `None` when the read fails.
    fn get_data(&mut self, window_secs: f64, picks: &[String]) -> Option<SampleBatch>;

    /// Releases the connection. Calling it again is a no-op.
    fn disconnect(&mut self);
}

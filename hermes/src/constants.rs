/// Central defaults for the Hermes relay

/// Default bind address for the relay server (all interfaces).
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the relay server.
pub const DEFAULT_PORT: u16 = 8765;

/// Samples held by each source connection. Also sets the send cadence together with the sample rate.
pub const DEFAULT_BUFFER_SIZE: usize = 200;

/// Send interval used when a stream reports an unknown (zero) sample rate.
pub const FALLBACK_INTERVAL_SECS: f64 = 0.1;

/// Time window requested from the source on every pull.
pub const PULL_WINDOW_SECS: f64 = 1.0;

/// Delay before retrying after an empty read. Zero retries immediately.
pub const DEFAULT_EMPTY_READ_BACKOFF_MS: u64 = 10;

pub const NO_STREAMS_MESSAGE: &str = "No streams available.";
pub const INVALID_STREAM_NAME_MESSAGE: &str = "Invalid stream name.";
pub const CONNECT_FAILED_MESSAGE: &str = "Failed to connect to stream.";

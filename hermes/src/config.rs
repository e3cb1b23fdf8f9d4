//! Relay configuration supplied at construction: bind address, source buffer size and the empty-read policy.
//! No file-based config; binaries map their `clap` arguments onto `RelayConfig`.

use crate::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_EMPTY_READ_BACKOFF_MS, DEFAULT_HOST, DEFAULT_PORT, PULL_WINDOW_SECS,
};
use crate::hermes_error;
use crate::utils::{ConnectionHandle, OrError};
use std::time::Duration;

/// What the stream loop does when a pull yields no usable batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyReadPolicy {
    /// Pause before the next pull. Zero retries at once, only yielding to the runtime.
    pub backoff: Duration,
    /// Ends the session after this many consecutive empty reads. `None` retries forever.
    pub max_consecutive: Option<u32>,
}

impl EmptyReadPolicy {
    /// Retry without pausing and without limit.
    pub fn immediate() -> Self {
        Self {
            backoff: Duration::ZERO,
            max_consecutive: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_consecutive(mut self, max_consecutive: Option<u32>) -> Self {
        self.max_consecutive = max_consecutive;
        self
    }

    /// Whether `consecutive` empty reads exhaust the policy.
    pub fn is_exhausted(&self, consecutive: u32) -> bool {
        self.max_consecutive.is_some_and(|max| consecutive >= max)
    }
}

impl Default for EmptyReadPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_millis(DEFAULT_EMPTY_READ_BACKOFF_MS),
            max_consecutive: None,
        }
    }
}

/// Per-session knobs, copied into every session the server starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub buffer_size: usize,
    pub window_secs: f64,
    pub empty_reads: EmptyReadPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            window_secs: PULL_WINDOW_SECS,
            empty_reads: EmptyReadPolicy::default(),
        }
    }
}

impl SessionSettings {
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_empty_reads(mut self, empty_reads: EmptyReadPolicy) -> Self {
        self.empty_reads = empty_reads;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub session: SessionSettings,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            session: SessionSettings::default(),
        }
    }
}

impl RelayConfig {
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.session.buffer_size = buffer_size;
        self
    }

    pub fn with_empty_reads(mut self, empty_reads: EmptyReadPolicy) -> Self {
        self.session.empty_reads = empty_reads;
        self
    }

    /// Rejects settings no session could run with. Called by `RelayServer::new`.
    pub fn validate(&self) -> OrError<()> {
        if self.session.buffer_size == 0 {
            return Err(hermes_error!("config::RelayConfig", "validate", "buffer size must be at least 1"));
        }
        if !(self.session.window_secs.is_finite() && self.session.window_secs > 0.0) {
            return Err(hermes_error!("config::RelayConfig", "validate", "pull window must be positive"));
        }
        if self.session.empty_reads.max_consecutive == Some(0) {
            return Err(hermes_error!(
                "config::RelayConfig",
                "validate",
                "max consecutive empty reads must be at least 1"
            ));
        }
        Ok(())
    }

    pub fn bind_handle(&self) -> OrError<ConnectionHandle> {
        ConnectionHandle::parse(&self.host, self.port)
    }
}

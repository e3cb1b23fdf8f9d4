use crate::{hermes_error, hermes_error_cause};
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};

pub type OrError<T> = Result<T, String>;

/// Creates standardized Hermes error message
#[macro_export]
macro_rules! hermes_error {
    ($component:expr, $method:expr, $msg:expr) => {
        format!("Hermes {} Error: {}", concat!($component, "::", $method), $msg)
    };
}

/// Creates error with cause chain
#[macro_export]
macro_rules! hermes_error_cause {
    ($component:expr, $method:expr, $msg:expr, $cause:expr) => {
        format!("Hermes {} Error: {}\nCaused by: {}",
            concat!($component, "::", $method), $msg, $cause)
    };
}

/// Host and port of a relay endpoint.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionHandle {
    addr: IpAddr,
    port: u16,
}

impl ConnectionHandle {
    pub fn new(addr: IpAddr, port: u16) -> Self {
        Self { addr, port }
    }

    /// Parses a textual host (IPv4 or IPv6 literal) into a handle.
    pub fn parse(host: &str, port: u16) -> OrError<Self> {
        if host.trim().is_empty() {
            return Err(hermes_error!("utils::ConnectionHandle", "parse", "host cannot be empty"));
        }
        let addr: IpAddr = host.trim().parse().map_err(|e| {
            hermes_error_cause!(
                "utils::ConnectionHandle",
                "parse",
                &format!("invalid host address '{}'", host),
                e
            )
        })?;
        Ok(Self { addr, port })
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }

    /// WebSocket URL a client uses to reach this endpoint.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self)
    }
}

impl From<SocketAddr> for ConnectionHandle {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl Display for ConnectionHandle {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.addr {
            IpAddr::V6(_) => write!(f, "[{}]:{}", self.addr, self.port),
            IpAddr::V4(_) => write!(f, "{}:{}", self.addr, self.port),
        }
    }
}

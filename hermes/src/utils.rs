mod common;
pub use common::{ConnectionHandle, OrError};

mod logging;
pub use logging::{init_logging, parse_level};

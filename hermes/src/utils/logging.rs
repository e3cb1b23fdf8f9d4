use crate::hermes_error_cause;
use crate::utils::OrError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Maps a `--log-level` argument onto a tracing level. Unknown values fall back to INFO.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Installs the process-wide subscriber. Call once from `main` before anything logs.
pub fn init_logging(level: &str) -> OrError<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| hermes_error_cause!("utils", "init_logging", "subscriber already installed", e))
}

use clap::Parser;
use hermes::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_EMPTY_READ_BACKOFF_MS, DEFAULT_HOST, DEFAULT_PORT};
use hermes::utils::init_logging;
use hermes::{EmptyReadPolicy, RelayConfig, RelayServer, SimulatedSource, StreamSource};
use indoc::indoc;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Hermes Relay Server - streams simulated EEG to WebSocket clients", long_about = None)]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST, help = "Bind address")]
    host: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE, help = "Samples buffered per source connection")]
    bufsize: usize,

    #[arg(long, default_value_t = DEFAULT_EMPTY_READ_BACKOFF_MS, help = "Delay after an empty read, 0 retries immediately")]
    backoff_ms: u64,

    #[arg(long, help = "End a session after this many consecutive empty reads")]
    max_empty_reads: Option<u32>,

    #[arg(short, long, default_value = "info", help = "trace | debug | info | warn | error")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level).map_err(|e| anyhow::anyhow!(e))?;

    let config = RelayConfig::default()
        .with_host(&args.host)
        .with_port(args.port)
        .with_buffer_size(args.bufsize)
        .with_empty_reads(
            EmptyReadPolicy::default()
                .with_backoff(Duration::from_millis(args.backoff_ms))
                .with_max_consecutive(args.max_empty_reads),
        );

    let source = Arc::new(SimulatedSource::with_default_streams());
    for stream in source.find_streams() {
        info!(stream = %stream.name, "simulated stream available");
    }

    let server = RelayServer::new(config, source)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    println!("Hermes relay running on {}", server.connection().ws_url());
    print!(
        "{}",
        indoc! {"
            Protocol: server sends {\"streams\": [...]}, client replies {\"stream_name\": ...},
            server sends {\"channels\": [...]} and then sample batches until the client disconnects.
            Press Ctrl+C to exit
        "}
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    drop(server);
    Ok(())
}

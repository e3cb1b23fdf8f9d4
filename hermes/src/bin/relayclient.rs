use clap::Parser;
use hermes::constants::DEFAULT_PORT;
use hermes::utils::init_logging;
use hermes::{ConnectionHandle, RelayClient};
use indoc::indoc;

#[derive(Parser)]
#[command(version, about = "Hermes Relay Client - selects a stream and prints incoming sample batches", long_about = None)]
struct Args {
    #[arg(long, default_value = "127.0.0.1", help = "Relay server IP address")]
    host: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, help = "Stream to select (defaults to the first advertised)")]
    stream: Option<String>,

    #[arg(short, long, help = "Stop after this many batches")]
    batches: Option<u64>,

    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level).map_err(|e| anyhow::anyhow!(e))?;

    let server = ConnectionHandle::parse(&args.host, args.port).map_err(|e| anyhow::anyhow!(e))?;
    println!("Connecting to relay at {}", server.ws_url());

    let mut client = match RelayClient::connect(server).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ Failed to connect to server: {}", e);
            print!(
                "{}",
                indoc! {"
                Make sure the relay is running: cargo run --bin relayserver
            "}
            );
            return Ok(());
        }
    };

    let streams = client.streams().await.map_err(|e| anyhow::anyhow!(e))?;
    println!("Available streams:");
    for stream in &streams {
        println!("   - {}", stream.name);
    }

    let selected = match args.stream {
        Some(name) => name,
        None => streams
            .first()
            .map(|s| s.name.clone())
            .ok_or_else(|| anyhow::anyhow!("server advertised no streams"))?,
    };
    let channels = client.select(&selected).await.map_err(|e| anyhow::anyhow!(e))?;
    println!("Selected {} with channels: {}", selected, channels.join(", "));
    println!("Listening for batches... (Press Ctrl+C to exit)\n");

    let mut received: u64 = 0;
    while let Some(frame) = client.next_frame().await.map_err(|e| anyhow::anyhow!(e))? {
        received += 1;
        let now = chrono::Utc::now();
        let first = frame.timestamps.first().copied().unwrap_or_default();
        let last = frame.timestamps.last().copied().unwrap_or_default();
        println!(
            "[{}] batch {}: {} rows x {} channels, t = {:.3}..{:.3}",
            now.format("%H:%M:%S%.3f"),
            received,
            frame.data.len(),
            frame.selected_channels.len(),
            first,
            last
        );
        if args.batches.is_some_and(|limit| received >= limit) {
            client.close().await.map_err(|e| anyhow::anyhow!(e))?;
            break;
        }
    }

    println!("Connection closed");
    Ok(())
}

//! ridelink - diagnostic client for the realtime chat and tracking channels

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use ridelink::auth::StaticTokenProvider;
use ridelink::chat::ChatClient;
use ridelink::config::RealtimeConfig;
use ridelink::session::Namespace;
use ridelink::tracking::TrackingClient;
use ridelink::transport::TcpConnector;

#[derive(Parser)]
#[command(name = "ridelink")]
#[command(about = "Tail and exercise the realtime chat and tracking channels")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Access token (falls back to $RIDELINK_TOKEN)
    #[arg(short, long)]
    token: Option<String>,

    /// Endpoint override, e.g. 127.0.0.1:7440
    #[arg(short, long)]
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a booking chat room, print messages, send stdin lines
    Chat {
        /// Booking id
        booking_id: String,
    },
    /// Join a trip tracking room and print driver positions
    Track {
        /// Trip id
        trip_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RealtimeConfig::load_from(path)?,
        None => RealtimeConfig::load()?,
    };
    if let Some(endpoint) = cli.endpoint {
        config.api_base_url = endpoint;
    }

    let token = match cli.token.or_else(|| std::env::var("RIDELINK_TOKEN").ok()) {
        Some(token) => token,
        None => bail!("No token given; pass --token or set $RIDELINK_TOKEN"),
    };
    let provider = StaticTokenProvider::new(token);

    match cli.command {
        Commands::Chat { booking_id } => run_chat(&config, provider, &booking_id).await,
        Commands::Track { trip_id } => run_track(&config, provider, &trip_id).await,
    }
}

async fn run_chat(
    config: &RealtimeConfig,
    provider: StaticTokenProvider,
    booking_id: &str,
) -> Result<()> {
    if config.endpoint_for(Namespace::Chat).is_empty() {
        bail!("No endpoint configured; set api_base_url or pass --endpoint");
    }
    let client = ChatClient::from_config(config, provider, TcpConnector::new());

    let _messages = client.subscribe_to_messages(|message| {
        if let Ok(line) = serde_json::to_string(message) {
            println!("{}", line);
        }
    });
    let _errors = client.subscribe_to_errors(|message| {
        eprintln!("server error: {}", message);
    });

    client.join_booking_room(booking_id).await?;
    client.request_booking_messages(booking_id).await?;
    tracing::info!("Joined booking room {}; type to send, Ctrl-C to quit", booking_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                match line? {
                    Some(text) => client.send_booking_message(booking_id, &text).await?,
                    None => break,
                }
            }
        }
    }

    client.leave_booking_room(booking_id).await?;
    Ok(())
}

async fn run_track(
    config: &RealtimeConfig,
    provider: StaticTokenProvider,
    trip_id: &str,
) -> Result<()> {
    if config.endpoint_for(Namespace::Tracking).is_empty() {
        bail!("No endpoint configured; set api_base_url or pass --endpoint");
    }
    let client = TrackingClient::from_config(config, provider, TcpConnector::new());

    let _locations = client.subscribe_to_driver_location(|update| {
        if let Ok(line) = serde_json::to_string(update) {
            println!("{}", line);
        }
    });
    let _errors = client.subscribe_to_errors(|message| {
        eprintln!("server error: {}", message);
    });

    client.join_trip(trip_id).await?;
    client.request_driver_location(trip_id).await?;
    tracing::info!("Joined trip room {}; Ctrl-C to quit", trip_id);

    tokio::signal::ctrl_c().await?;

    client.leave_trip(trip_id).await?;
    Ok(())
}

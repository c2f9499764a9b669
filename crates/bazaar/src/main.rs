use std::time::Duration;

use bazaar::prelude::*;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Runs a Bazaar game server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Milliseconds between clock ticks (0 = clock only moves on debug ticks)
    #[clap(short, long, default_value = "100")]
    tick_ms: u64,
    /// Players that must be ready before an auction starts
    #[clap(short, long, default_value = "2")]
    min_players: usize,
    /// Seed for auction randomness (random if omitted)
    #[clap(short, long)]
    seed: Option<u64>,
    /// Let clients drive the clock with `tick` messages
    #[clap(long)]
    debug_ticks: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let game_config = GameConfig {
        min_players: args.min_players,
        seed: args.seed,
        debug_ticks: args.debug_ticks,
        ..GameConfig::default()
    };
    let ticker = TickerConfig::with_interval(Duration::from_millis(args.tick_ms));

    let server = BazaarServer::builder()
        .bind(&format!("{}:{}", args.host, args.port))
        .game_config(game_config)
        .ticker(ticker)
        .build()
        .await?;

    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await?;
    Ok(())
}

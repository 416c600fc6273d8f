//! Relay Hub Server
//!
//! Run with: cargo run -- --port 8025
//!
//! # Configuration
//!
//! Settings come from the first config file found (`--config`, then the
//! default locations), environment variables, and finally command-line flags:
//! - `RELAY_HOST`: Host to bind to (default: 127.0.0.1)
//! - `RELAY_PORT`: Port to listen on (default: 8025)
//! - `RELAY_LOG_LEVEL`: Log level (default: info)
//! - `RELAY_LOG_FORMAT`: pretty or json (default: pretty)
//! - `RUST_LOG`: Full filter directive, overrides the level

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use relay_hub::config::{generate_default_config, Config};
use relay_hub::logging::init_logging;
use relay_hub::server::{serve, AppState};

#[derive(Parser)]
#[command(name = "relay-hub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time WebSocket relay hub")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_logging(&config.logging);

    tracing::info!("Starting relay hub v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(config.server.clone());
    serve(state, &config.server)
        .await
        .context("relay server failed")?;

    tracing::info!("Relay hub stopped");
    Ok(())
}

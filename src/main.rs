//! Lumen API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser                ┌──────────────────────────────────────────────┐
//!     ──────────────────────▶│  http server ─▶ gate ─▶ translate ─▶ forward │──▶ Backend
//!                            │                                      │       │   (expense /
//!     ◀──────────────────────│  normalize ◀─────────────────────────┘       │    documents)
//!                            │                                              │
//!                            │  config · identity · observability · lifecycle│
//!                            └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use lumen_gateway::config::load_config;
use lumen_gateway::lifecycle::{build_state, signals, Shutdown, StartupError};
use lumen_gateway::observability::{logging, metrics};
use lumen_gateway::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "lumen-gateway", version, about = "API gateway for the Lumen backends")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let cli = Cli::parse();

    let logs = logging::init_logging(logging::BOOTSTRAP_LEVEL)
        .map_err(|e| StartupError::Logging(e.to_string()))?;

    let config = load_config(&cli.config)?;
    if cli.check {
        println!("configuration OK: {}", cli.config.display());
        return Ok(());
    }

    logs.apply(&config.observability)
        .map_err(|e| StartupError::Logging(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "lumen-gateway starting"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let state = build_state(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::forward_signals(shutdown));

    HttpServer::new(config, state)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

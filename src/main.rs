//! Robot-verification gate.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     ROBOT GATE                        │
//!                      │                                                       │
//!   Client Request     │  ┌──────────┐   ┌────────────┐   ┌──────────────┐    │
//!   ───────────────────┼─▶│ endpoint │──▶│ rate limit │──▶│ session gate │    │
//!                      │  │ resolve  │   │ (per IP)   │   │ (allow-list) │    │
//!                      │  └──────────┘   └────────────┘   └──────┬───────┘    │
//!                      │                                        │            │
//!                      │                                        ▼            │
//!                      │  ┌──────────┐                   ┌──────────────┐    │
//!   Client Response    │  │  error   │◀──────────────────│   handlers   │    │
//!   ◀──────────────────┼──│  mask    │                   │ robot, verify│    │
//!                      │  └──────────┘                   │ index, api   │    │
//!                      │                                 └──────────────┘    │
//!                      │  ┌─────────────────────────────────────────────────┐ │
//!                      │  │ config · sessions · logging/metrics · lifecycle │ │
//!                      │  └─────────────────────────────────────────────────┘ │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use robot_gate::config::load_config;
use robot_gate::observability::{logging, metrics};
use robot_gate::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "robot-gate")]
#[command(about = "Session-gated web front-end with per-IP rate limiting", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "ROBOT_GATE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address (e.g. 127.0.0.1:5000).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.bind)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("robot-gate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        default_quota = %config.rate_limit.default,
        trusted_hops = config.proxy.trusted_hops,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

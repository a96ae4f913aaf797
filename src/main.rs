//! term-gateway
//!
//! Single public entry point in front of a ttyd terminal.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ request id ─▶ trace ─▶ catch panic ─▶ body limit ─▶ origin guard
//!                                                                     │
//!                                                                     ▼
//!                                                              route table
//!                                                                     │
//!                                                   per-route sliding-window limiter
//!                                                                     │
//!          ┌──────────────┬──────────────┬────────────────────┬───────┴──────┐
//!          ▼              ▼              ▼                    ▼              ▼
//!      /health        /config        /upload         /terminal (HTTP, WS)   static
//!                                  (upload dir)        ──▶ ttyd backend     files
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use term_gateway::config::{self, loader::CONFIG_PATH_ENV};
use term_gateway::lifecycle::{signals, startup, Shutdown};
use term_gateway::observability::{logging, metrics};
use term_gateway::GatewayServer;

#[derive(Parser, Debug)]
#[command(name = "term-gateway", version, about = "Edge gateway for a browser terminal")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "term-gateway starting");

    tracing::info!(
        bind_address = %config.bind_address(),
        ttyd = %format!("{}:{}", config.terminal.host, config.terminal.port),
        upload_dir = %config.uploads.dir.display(),
        static_dir = %config.static_files.dir.display(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = startup::prepare(&config).await?;

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let finished_early = tokio::select! {
        _ = shutdown.trigger_on(signals::wait_for_signal()) => None,
        result = &mut server_task => Some(result),
    };
    match finished_early {
        Some(result) => result??,
        None => server_task.await??,
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

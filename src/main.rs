//! KraznikUnderverse mint service.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser ──▶ http (page, forms, JSON API)
//!                  │
//!                  ▼
//!               mint::MintClient ──▶ contract (storage view, mint call)
//!                  │
//!          ┌───────┴────────┐
//!          ▼                ▼
//!   wallet (remote     blockchain (node RPC,
//!   signer, session)   forge, inject, confirm)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use kraznik_mint::config::{default_config, load_config};
use kraznik_mint::lifecycle::{bootstrap, Shutdown};
use kraznik_mint::observability::{init_logging, init_metrics};
use kraznik_mint::HttpServer;

#[derive(Parser)]
#[command(name = "kraznik-mint")]
#[command(about = "Mint page for the KraznikCollections contract", long_about = None)]
struct Args {
    /// Path to a TOML configuration file; defaults are used without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    init_logging(&config.observability);
    tracing::info!("kraznik-mint v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        network = %config.network.network,
        rpc_url = %config.network.rpc_url,
        contract = %config.contract.address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mint = bootstrap(&config).await?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let signalled = shutdown.signalled();
    tokio::spawn(async move { shutdown.trigger_on_signal().await });

    HttpServer::new(&config.server, mint)
        .run(listener, signalled)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! REST bridge host.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ net::listener ──▶ net::connection ──▶ server::pipeline
//!                                                               │
//!                       http::header / http::body ◀─────────────┤ decode
//!                       adapters (pre_digest)     ◀─────────────┤
//!                       routing::Router           ◀─────────────┤ execute
//!                       adapters (post_digest..)  ◀─────────────┤
//!                       http::body / http::header ◀─────────────┤ encode
//!     Client Response                                           │
//!     ◀─────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use rest_bridge::config::{load_config, BridgeConfig};
use rest_bridge::interfaces::{DiscoveryInterface, EchoInterface};
use rest_bridge::net::Listener;
use rest_bridge::observability::init_logging;
use rest_bridge::routing::Interface;
use rest_bridge::{Server, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "rest-bridge", version, about = "Serve command interfaces over HTTP")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        marshaller = ?config.transport.marshaller,
        "Configuration loaded"
    );

    let interfaces: Vec<Arc<dyn Interface>> = vec![Arc::new(DiscoveryInterface::new()), Arc::new(EchoInterface)];
    let server = Server::from_config(&config, &interfaces)?;

    let listener = Listener::bind(&config.listener).await?;
    let shutdown = Shutdown::new();
    tokio::spawn(shutdown.clone().trigger_on_ctrl_c());

    server.run(listener, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

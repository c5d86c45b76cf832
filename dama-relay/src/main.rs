//! dama-relay binary entry point.
//!
//! Usage:
//! ```bash
//! dama-relay --config relay.toml
//! dama-relay --bind 127.0.0.1:3001
//! dama-relay --help
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use dama_relay::cleanup::spawn_cleanup_task;
use dama_relay::config::Config;
use dama_relay::http::{self, health};
use dama_relay::server::DamaRelay;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Matchmaking and move relay server for Dama.
#[derive(Parser, Debug)]
#[command(name = "dama-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (defaults apply if it is missing)
    #[arg(long, default_value = "relay.toml")]
    config: PathBuf,

    /// Override `server.bind_address`
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("dama_relay=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        Config::from_file(&cli.config)
            .with_context(|| format!("Failed to load {}", cli.config.display()))?
    } else {
        tracing::info!(
            "No config file at {}, using defaults",
            cli.config.display()
        );
        Config::default()
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    health::init_start_time();

    let bind_address = config.server.bind_address.clone();
    let cleanup = config.cleanup.clone();
    let relay = Arc::new(DamaRelay::new(config));
    let cleanup_task = spawn_cleanup_task(relay.clone(), cleanup);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!(
        "dama-relay v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        listener.local_addr().context("Listener has no address")?
    );

    http::serve(listener, relay, shutdown_signal())
        .await
        .context("Server error")?;

    cleanup_task.abort();
    tracing::info!("dama-relay shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

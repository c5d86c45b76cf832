//! # dama-cli
//!
//! Terminal client for Dama.
//!
//! ## Commands
//!
//! - `play`: Find an opponent through a relay and play
//! - `replay`: Replay a move log offline and print the result
//!
//! ## Example
//!
//! ```bash
//! # Open matchmaking
//! dama-cli play --seek
//!
//! # Open a private room and share the printed code
//! dama-cli play --create
//!
//! # On another machine, join it
//! dama-cli play --join AB12CD --relay ws://relay.example:3001/ws
//!
//! # Check a saved game
//! dama-cli replay game.json
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dama_client::ClientConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod input;
mod render;

use commands::play::Lobby;
use commands::{play, replay};

/// Terminal client for Dama.
#[derive(Parser, Debug)]
#[command(name = "dama-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a match through a relay
    Play {
        /// Relay WebSocket URL
        #[arg(long, default_value = "ws://127.0.0.1:3001/ws")]
        relay: String,

        #[command(flatten)]
        lobby: LobbyArgs,

        /// Seconds per turn
        #[arg(long, default_value = "60")]
        turn_seconds: u64,

        /// Check opponent moves against the rules before applying them
        #[arg(long)]
        verify: bool,
    },

    /// Replay a move log (JSON array or JSON lines of {von, nach})
    Replay {
        /// Move log file
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct LobbyArgs {
    /// Enter open matchmaking
    #[arg(long)]
    seek: bool,

    /// Create a private room
    #[arg(long)]
    create: bool,

    /// Join a private room by code
    #[arg(long, value_name = "CODE")]
    join: Option<String>,
}

impl LobbyArgs {
    fn into_lobby(self) -> Lobby {
        match self.join {
            Some(code) => Lobby::Join(code),
            None if self.create => Lobby::Create,
            None => Lobby::Seek,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("dama_cli=warn".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            relay,
            lobby,
            turn_seconds,
            verify,
        } => {
            if turn_seconds == 0 {
                anyhow::bail!("--turn-seconds must be greater than zero");
            }
            let config = ClientConfig::new(&relay)
                .with_turn_duration(Duration::from_secs(turn_seconds))
                .with_verified_remote_moves(verify);
            play::run(config, lobby.into_lobby()).await?;
        }
        Commands::Replay { file } => {
            replay::run(&file).await?;
        }
    }

    Ok(())
}

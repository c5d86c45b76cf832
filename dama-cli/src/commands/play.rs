//! Play a match through a relay.

use anyhow::{Context, Result};
use dama_client::{ClientConfig, ClientError, ClientEvent, GameClient, WsTransport};
use dama_core::MatchEvent;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::input::{self, Command, InputError};
use crate::render;

/// How to find an opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lobby {
    /// Open matchmaking.
    Seek,
    /// Open a private room and wait for a friend.
    Create,
    /// Join a friend's room.
    Join(String),
}

enum Step {
    Relay(Result<ClientEvent, ClientError>),
    Line(std::io::Result<Option<String>>),
}

/// Run the play command.
pub async fn run(config: ClientConfig, lobby: Lobby) -> Result<()> {
    let relay_url = config.relay_url.clone();
    let client = GameClient::new(config, WsTransport::new());
    client
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", relay_url))?;
    println!("Connected to {}", relay_url);

    match &lobby {
        Lobby::Seek => {
            client.seek_game().await?;
            println!("Looking for an opponent...");
        }
        Lobby::Create => {
            client.create_room().await?;
            println!("Creating a private room...");
        }
        Lobby::Join(code) => {
            client.join_room(code).await?;
            println!("Joining room {}...", code);
        }
    }
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Kept across iterations so a half-received relay frame is never dropped
    let mut next = Box::pin(client.next_event());

    loop {
        let step = tokio::select! {
            event = &mut next => Step::Relay(event),
            line = lines.next_line() => Step::Line(line),
        };

        match step {
            Step::Relay(event) => {
                next = Box::pin(client.next_event());
                let event = event?;
                println!("{}", render::describe_client(&event));
                match event {
                    ClientEvent::Disconnected => break,
                    ClientEvent::Match(event) => show_board_if_changed(&client, &event).await,
                    _ => {}
                }
            }
            Step::Line(line) => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if !handle_line(&client, &line).await? {
                    break;
                }
            }
        }
    }

    drop(next);
    client.disconnect().await?;
    Ok(())
}

/// Act on one input line. Returns `false` when the user wants to leave.
async fn handle_line(client: &GameClient<WsTransport>, line: &str) -> Result<bool> {
    let command = match input::parse(line) {
        Ok(command) => command,
        Err(InputError::Empty) => return Ok(true),
        Err(e) => {
            println!("{}", e);
            return Ok(true);
        }
    };

    let events = match command {
        Command::Quit => return Ok(false),
        Command::Help => {
            println!("{}", input::HELP);
            return Ok(true);
        }
        Command::Board => {
            print_board(client).await;
            return Ok(true);
        }
        Command::Reset => client.reset().await?,
        Command::Select(pos) => client.select(pos).await?,
        Command::Move(mv) => match client.play(mv).await {
            Ok(events) => events,
            Err(ClientError::Move(e)) => {
                println!("Rejected: {}", e);
                return Ok(true);
            }
            Err(e) => {
                // The board already shows the move; the opponent never got it
                println!("Move not delivered: {}", e);
                println!("{}", render::describe_client(&ClientEvent::Disconnected));
                return Ok(false);
            }
        },
    };

    for event in &events {
        println!("{}", render::describe(event));
    }
    if events.iter().any(render::needs_redraw) {
        print_board(client).await;
    }
    Ok(true)
}

async fn show_board_if_changed(client: &GameClient<WsTransport>, event: &MatchEvent) {
    if render::needs_redraw(event) {
        print_board(client).await;
    }
}

async fn print_board(client: &GameClient<WsTransport>) {
    let state = client.snapshot().await;
    println!("{}", state.board());
    println!("{}", render::status(&state, Instant::now()));
    if let Some(error) = client.current_error().await {
        println!("Relay: {}", error);
    }
}

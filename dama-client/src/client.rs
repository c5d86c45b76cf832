//! GameClient - the main interface for playing Dama over a relay.
//!
//! This module provides [`GameClient`], the primary API for applications
//! to play a match against a remote opponent.
//!
//! # Architecture
//!
//! GameClient uses the pure match state machine (from dama-core) for game
//! logic and interprets its actions to perform actual I/O via the Transport
//! trait.
//!
//! ```text
//! Application → GameClient → Transport → Relay → opponent
//!                   ↓
//!              dama-core (pure state machine)
//! ```
//!
//! Inbound relay frames and turn-timer expiry are serialized onto one
//! timeline by [`GameClient::next_event`].
//!
//! # Example
//!
//! ```ignore
//! use dama_client::{ClientConfig, GameClient, WsTransport};
//!
//! let client = GameClient::new(ClientConfig::new("ws://127.0.0.1:3001/ws"), WsTransport::new());
//! client.connect().await?;
//! client.seek_game().await?;
//! loop {
//!     let event = client.next_event().await?;
//!     println!("{:?}", event);
//! }
//! ```

use dama_core::{
    on_remote_move, Action, GameEvent, MatchConfig, MatchEvent, MatchState, Move, MoveError,
};
use dama_types::{ClientMessage, Player, Position, RelayMessage, RoomCode, WireError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::transport::{Transport, TransportError};

/// How long a relay error stays visible.
pub const DEFAULT_ERROR_DISPLAY: Duration = Duration::from_secs(3);

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding or decoding a frame failed.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Not connected to relay.
    #[error("not connected")]
    NotConnected,

    /// The local move was refused.
    #[error("move rejected: {0}")]
    Move(#[from] MoveError),
}

/// Configuration for GameClient.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the relay (`ws://host:port/ws`).
    pub relay_url: String,
    /// Rules and clock settings for matches.
    pub match_config: MatchConfig,
    /// How long a relay error stays visible.
    pub error_display: Duration,
}

impl ClientConfig {
    /// Create a configuration with default match settings.
    pub fn new(relay_url: &str) -> Self {
        Self {
            relay_url: relay_url.to_string(),
            match_config: MatchConfig::default(),
            error_display: DEFAULT_ERROR_DISPLAY,
        }
    }

    /// Set the turn duration.
    pub fn with_turn_duration(mut self, duration: Duration) -> Self {
        self.match_config.turn_duration = duration;
        self
    }

    /// Check incoming moves against the rules before applying them.
    pub fn with_verified_remote_moves(mut self, verify: bool) -> Self {
        self.match_config.verify_remote_moves = verify;
        self
    }
}

/// What happened, from the application's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The relay assigned our seat.
    SeatAssigned(Player),
    /// The relay created a private room for us.
    RoomCreated(RoomCode),
    /// The relay reported a problem (shown transiently).
    RelayError(String),
    /// Something happened in the match.
    Match(MatchEvent),
    /// The relay connection is gone. Terminal.
    Disconnected,
}

struct RelayErrorNotice {
    message: String,
    shown_at: Instant,
}

/// The main game client.
///
/// Manages the relay connection and one local replica of the match.
pub struct GameClient<T: Transport> {
    config: ClientConfig,
    transport: T,
    state: Arc<Mutex<MatchState>>,
    pending: Arc<Mutex<VecDeque<ClientEvent>>>,
    last_error: Arc<Mutex<Option<RelayErrorNotice>>>,
}

/// Current instant on tokio's clock, so paused-time tests line up with
/// `sleep_until`.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

impl<T: Transport> GameClient<T> {
    /// Create a new GameClient.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let state = MatchState::new(config.match_config);
        Self {
            config,
            transport,
            state: Arc::new(Mutex::new(state)),
            pending: Arc::new(Mutex::new(VecDeque::new())),
            last_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Connect to the relay.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.transport.connect(&self.config.relay_url).await?;
        tracing::info!(relay = %self.config.relay_url, "Connected");
        Ok(())
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Disconnect from the relay.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.transport.close().await?;
        Ok(())
    }

    /// Enter open matchmaking.
    pub async fn seek_game(&self) -> Result<(), ClientError> {
        self.send(&ClientMessage::SeekGame).await
    }

    /// Ask the relay for a private room. The code arrives as
    /// [`ClientEvent::RoomCreated`].
    pub async fn create_room(&self) -> Result<(), ClientError> {
        self.send(&ClientMessage::CreateRoom).await
    }

    /// Join a private room by code.
    pub async fn join_room(&self, code: &str) -> Result<(), ClientError> {
        self.send(&ClientMessage::JoinRoom(code.to_string())).await
    }

    /// Click a square: select a piece, or move the selected piece there.
    ///
    /// Refusals come back as [`MatchEvent::MoveRejected`], not as errors.
    pub async fn select(&self, pos: Position) -> Result<Vec<MatchEvent>, ClientError> {
        self.apply(GameEvent::SquareSelected(pos)).await
    }

    /// Play a whole move. The move is sent to the opponent only if the rules
    /// accept it.
    ///
    /// The move is applied to the local replica before it is sent. If the
    /// send fails the replicas have diverged: the error is returned and the
    /// next call to [`next_event`](Self::next_event) reports
    /// [`ClientEvent::Disconnected`].
    pub async fn play(&self, mv: Move) -> Result<Vec<MatchEvent>, ClientError> {
        let events = self.apply(GameEvent::LocalMove(mv)).await?;
        match events.iter().find_map(|e| match e {
            MatchEvent::MoveRejected(err) => Some(*err),
            _ => None,
        }) {
            Some(err) => Err(ClientError::Move(err)),
            None => Ok(events),
        }
    }

    /// Start over with the initial layout. Seat is kept.
    pub async fn reset(&self) -> Result<Vec<MatchEvent>, ClientError> {
        self.apply(GameEvent::Reset).await
    }

    /// Wait for the next thing to happen: a relay event or turn-clock
    /// expiry, whichever comes first.
    pub async fn next_event(&self) -> Result<ClientEvent, ClientError> {
        loop {
            if let Some(event) = self.pending.lock().await.pop_front() {
                return Ok(event);
            }

            let deadline = self.state.lock().await.turn_deadline();
            let timer = async {
                match deadline {
                    Some(at) => {
                        tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                frame = self.transport.recv() => match frame {
                    Ok(text) => self.handle_frame(&text).await?,
                    Err(TransportError::ConnectionClosed) => {
                        tracing::info!("Relay connection closed");
                        return Ok(ClientEvent::Disconnected);
                    }
                    Err(e) if !self.transport.is_connected() => {
                        tracing::warn!(error = %e, "Relay connection lost");
                        return Ok(ClientEvent::Disconnected);
                    }
                    Err(e) => return Err(e.into()),
                },
                _ = timer => {
                    let events = self.apply(GameEvent::TurnTimerFired).await?;
                    self.queue(events.into_iter().map(ClientEvent::Match)).await;
                }
            }
        }
    }

    /// Decode one relay frame and feed it through the state machine.
    ///
    /// Unreadable frames are logged and dropped.
    async fn handle_frame(&self, text: &str) -> Result<(), ClientError> {
        match RelayMessage::from_json(text) {
            Ok(msg) => {
                let events = self.handle_relay_message(msg).await?;
                self.queue(events).await;
            }
            Err(e) => tracing::warn!(error = %e, "Dropping unreadable relay frame"),
        }
        Ok(())
    }

    /// Map one relay event onto the local match.
    pub async fn handle_relay_message(
        &self,
        msg: RelayMessage,
    ) -> Result<Vec<ClientEvent>, ClientError> {
        let events = match msg {
            RelayMessage::PlayerAssigned(seat) => {
                tracing::info!(%seat, "Seat assigned");
                self.apply(GameEvent::SeatAssigned(seat)).await?;
                vec![ClientEvent::SeatAssigned(seat)]
            }
            RelayMessage::GameStarted => self.match_events(GameEvent::MatchStarted).await?,
            RelayMessage::RoomCreated(code) => vec![ClientEvent::RoomCreated(code)],
            RelayMessage::Error(message) => {
                tracing::warn!(%message, "Relay error");
                *self.last_error.lock().await = Some(RelayErrorNotice {
                    message: message.clone(),
                    shown_at: now(),
                });
                vec![ClientEvent::RelayError(message)]
            }
            RelayMessage::OpponentMove(payload) => {
                let actions = {
                    let mut state = self.state.lock().await;
                    let (next, actions) = on_remote_move(state.clone(), &payload, now());
                    *state = next;
                    actions
                };
                self.execute(actions)
                    .await?
                    .into_iter()
                    .map(ClientEvent::Match)
                    .collect()
            }
            RelayMessage::OpponentLeft => {
                tracing::info!("Opponent left");
                self.match_events(GameEvent::OpponentLeft).await?
            }
        };
        Ok(events)
    }

    async fn match_events(&self, event: GameEvent) -> Result<Vec<ClientEvent>, ClientError> {
        Ok(self
            .apply(event)
            .await?
            .into_iter()
            .map(ClientEvent::Match)
            .collect())
    }

    /// Run an event through the state machine and execute the actions.
    async fn apply(&self, event: GameEvent) -> Result<Vec<MatchEvent>, ClientError> {
        let actions = {
            let mut state = self.state.lock().await;
            let (next, actions) = state.clone().on_event(event, now());
            *state = next;
            actions
        };
        self.execute(actions).await
    }

    /// Perform side effects and collect application events.
    async fn execute(&self, actions: Vec<Action>) -> Result<Vec<MatchEvent>, ClientError> {
        let mut events = Vec::new();
        for action in actions {
            match action {
                Action::SendMove(mv) => {
                    tracing::debug!(%mv, "Sending move");
                    if let Err(e) = self.send(&dama_core::emit_move(mv)?).await {
                        tracing::error!(%mv, error = %e, "Move applied locally but not delivered");
                        self.queue([ClientEvent::Disconnected]).await;
                        return Err(e);
                    }
                }
                // next_event reads the deadline straight from the state.
                Action::StartTurnTimer { .. } | Action::CancelTurnTimer => {}
                Action::Emit(event) => events.push(event),
            }
        }
        Ok(events)
    }

    async fn send(&self, msg: &ClientMessage) -> Result<(), ClientError> {
        if !self.transport.is_connected() {
            return Err(ClientError::NotConnected);
        }
        self.transport.send(&msg.to_json()?).await?;
        Ok(())
    }

    async fn queue(&self, events: impl IntoIterator<Item = ClientEvent>) {
        self.pending.lock().await.extend(events);
    }

    /// The last relay error, while it is still within its display window.
    pub async fn current_error(&self) -> Option<String> {
        let guard = self.last_error.lock().await;
        guard
            .as_ref()
            .filter(|notice| {
                now().saturating_duration_since(notice.shown_at) < self.config.error_display
            })
            .map(|notice| notice.message.clone())
    }

    /// A snapshot of the local replica.
    pub async fn snapshot(&self) -> MatchState {
        self.state.lock().await.clone()
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

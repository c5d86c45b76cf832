//! Protocol events exchanged with the relay.
//!
//! Every event travels as one JSON text frame shaped
//! `{"event": <name>, "data": <payload>}`; `data` is absent for events
//! without a payload. Event names are fixed for compatibility with
//! existing clients.

use serde::{Deserialize, Serialize};

use crate::{Player, Position, RoomCode, WireError};

/// Largest text frame either side accepts (4 KiB).
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024;

/// Events a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Enter open matchmaking.
    #[serde(rename = "spielSuchen")]
    SeekGame,
    /// Ask the relay for a new private room.
    #[serde(rename = "raumErstellen")]
    CreateRoom,
    /// Join a private room by code (as typed; the relay normalizes it).
    #[serde(rename = "raumBetreten")]
    JoinRoom(String),
    /// A locally validated move, forwarded verbatim to the opponent.
    #[serde(rename = "zug")]
    Move(MovePayload),
}

/// Events the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RelayMessage {
    /// Seat color for the upcoming match.
    #[serde(rename = "spielerZugewiesen")]
    PlayerAssigned(Player),
    /// Both seats are filled.
    #[serde(rename = "spielGestartet")]
    GameStarted,
    /// Code of the room this client just created.
    #[serde(rename = "raumErstellt")]
    RoomCreated(RoomCode),
    /// Human-readable failure (unknown room, full room, rate limit).
    #[serde(rename = "fehler")]
    Error(String),
    /// The opponent's `zug` payload, untouched.
    #[serde(rename = "gegnerZug")]
    OpponentMove(MovePayload),
    /// The paired connection went away.
    #[serde(rename = "gegnerGetrennt")]
    OpponentLeft,
}

impl ClientMessage {
    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Serialization)
    }

    /// Decode a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(WireError::Deserialization)
    }
}

impl RelayMessage {
    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Serialization)
    }

    /// Decode a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        serde_json::from_str(text).map_err(WireError::Deserialization)
    }
}

/// A move as it appears on the wire: `{"von": Position, "nach": Position}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMove {
    /// Source square.
    #[serde(rename = "von")]
    pub from: Position,
    /// Destination square.
    #[serde(rename = "nach")]
    pub to: Position,
}

/// Opaque move payload.
///
/// The relay never looks inside; clients decode it into a [`WireMove`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovePayload(serde_json::Value);

impl MovePayload {
    /// Wrap a move for sending.
    pub fn from_move(mv: &WireMove) -> Result<Self, WireError> {
        serde_json::to_value(mv)
            .map(Self)
            .map_err(WireError::Serialization)
    }

    /// Wrap an arbitrary JSON value (what the relay sees).
    pub fn from_value(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Interpret the payload as a move.
    pub fn decode(&self) -> Result<WireMove, WireError> {
        WireMove::deserialize(&self.0).map_err(WireError::Deserialization)
    }

    /// Size of the encoded payload in bytes.
    pub fn encoded_len(&self) -> usize {
        self.0.to_string().len()
    }
}

//! # dama-types
//!
//! Wire format types for the Dama relay protocol.
//!
//! This crate provides the foundational types used across all Dama crates:
//! - [`Position`], [`Player`] - Board coordinates and seat colors
//! - [`ConnectionId`], [`RoomCode`] - Relay-side identities
//! - [`ClientMessage`], [`RelayMessage`] - Protocol events (JSON text frames)
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;
mod position;

pub use error::WireError;
pub use ids::{ConnectionId, RoomCode, ROOM_CODE_LEN};
pub use messages::{ClientMessage, MovePayload, RelayMessage, WireMove, MAX_MESSAGE_SIZE};
pub use position::{Player, Position, BOARD_SIZE};

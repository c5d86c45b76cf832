//! # dama-client
//!
//! Client library for networked Dama matches.
//!
//! This is the main library that applications use to play through a relay.
//!
//! ## Features
//!
//! - **Transport Abstraction**: Pluggable transport layer (WebSocket, mock)
//! - **Pure State Machine**: Uses dama-core for side-effect-free game logic
//! - **One Timeline**: Relay events and turn-clock expiry are serialized
//!
//! ## Example
//!
//! ```ignore
//! use dama_client::{ClientConfig, GameClient, WsTransport};
//!
//! let client = GameClient::new(ClientConfig::new("ws://127.0.0.1:3001/ws"), WsTransport::new());
//! client.connect().await?;
//! client.create_room().await?;
//!
//! // Wait for the room code, the opponent and their moves
//! let event = client.next_event().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod transport;

pub use client::{ClientConfig, ClientError, ClientEvent, GameClient, DEFAULT_ERROR_DISPLAY};
pub use transport::{MockTransport, Transport, TransportError, WsTransport, WsTransportConfig};

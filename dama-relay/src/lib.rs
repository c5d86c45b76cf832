//! # dama-relay
//!
//! Matchmaking and move relay server for Dama.
//!
//! This crate implements a relay server that:
//! - Accepts WebSocket connections from clients
//! - Pairs two players through open matchmaking or private rooms
//! - Forwards each move verbatim to the opponent
//! - Never checks move legality (clients own the rules)
//!
//! ## Architecture
//!
//! ```text
//! Client A ──┐                    ┌── Client B
//!            │   WebSocket/JSON   │
//!            ├───────────────────►│
//!            │                    │
//!        ┌───┴────────────────────┴───┐
//!        │         dama-relay         │
//!        │  ┌─────────────────────┐   │
//!        │  │ Lobby (slot, rooms, │   │
//!        │  │        pairings)    │   │
//!        │  └─────────────────────┘   │
//!        └────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! JSON text frames `{"event", "data"}` on `/ws`:
//! - spielSuchen → spielerZugewiesen + spielGestartet (once paired)
//! - raumErstellen → raumErstellt
//! - raumBetreten → spielerZugewiesen + spielGestartet, or fehler
//! - zug → gegnerZug (to the opponent only)
//! - gegnerGetrennt (relay → client, opponent disconnected)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleanup;
pub mod config;
pub mod error;
pub mod http;
pub mod limits;
pub mod lobby;
pub mod protocol;
pub mod server;
pub mod session;

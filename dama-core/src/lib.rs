//! # dama-core
//!
//! Pure rules and match logic for Dama (no I/O, instant tests).
//!
//! This crate implements the board, the rules engine and the match state
//! machine without any network access, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. Time is passed in, never read.
//!
//! The actual I/O (relay connection, timers) is performed by `dama-client`,
//! which interprets the actions produced by [`MatchState::on_event`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod board;
pub mod clock;
pub mod game;
pub mod rules;
pub mod sync;

pub use board::{Board, Piece};
pub use clock::{TurnClock, DEFAULT_TURN_DURATION};
pub use game::{
    Action, FinishReason, GameEvent, MatchConfig, MatchEvent, MatchState, MoveError, Phase,
};
pub use rules::{apply_move, Applied, Move, MoveKind};
pub use sync::{decode_remote, emit_move, on_remote_move, replay, ReplayError};

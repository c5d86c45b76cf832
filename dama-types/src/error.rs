//! Error types for the Dama wire format.

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire types.
#[derive(Debug, Error)]
pub enum WireError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Room code is not six ASCII alphanumerics
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// Coordinates outside the 8x8 board
    #[error("position off the board: ({row}, {col})")]
    InvalidPosition {
        /// Row as received.
        row: i64,
        /// Column as received.
        col: i64,
    },
}

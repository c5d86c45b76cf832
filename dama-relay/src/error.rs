//! Error types for dama-relay.

use dama_types::WireError;

/// Main error type for dama-relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Protocol layer errors for one inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Frame exceeds the size limit.
    #[error("message too large: {size} > {limit}")]
    MessageTooLarge {
        /// Actual size of the frame.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },

    /// Frame is not a text frame.
    #[error("invalid message format: {reason}")]
    InvalidMessage {
        /// Reason the frame is invalid.
        reason: String,
    },

    /// Frame is not a known protocol event.
    #[error("message decoding failed: {0}")]
    Wire(#[from] WireError),

    /// Rate limit exceeded.
    #[error("rate limit exceeded: {reason}")]
    RateLimited {
        /// Reason for rate limiting.
        reason: String,
    },
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

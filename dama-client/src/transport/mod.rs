//! Transport abstraction for Dama clients.
//!
//! This module provides a pluggable transport layer that abstracts
//! the connection to the relay (WebSocket, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes a connection
//! - `send()` transmits one JSON text frame
//! - `recv()` receives one JSON text frame
//! - `close()` gracefully terminates
//!
//! # Example
//!
//! ```ignore
//! let transport = WsTransport::new();
//! transport.connect("ws://127.0.0.1:3001/ws").await?;
//! transport.send(r#"{"event":"spielSuchen"}"#).await?;
//! let frame = transport.recv().await?;
//! ```

mod mock;
mod ws;

pub use mock::MockTransport;
pub use ws::{WsTransport, WsTransportConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connection timeout.
    #[error("connection timeout")]
    Timeout,
}

/// Transport trait for exchanging protocol frames with the relay.
///
/// Implementations handle the underlying connection mechanism
/// (WebSocket, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the relay at the given address.
    ///
    /// For WebSocket this is a `ws://` URL. For testing, it's arbitrary.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send one text frame.
    async fn send(&self, frame: &str) -> Result<(), TransportError>;

    /// Receive one text frame.
    ///
    /// Blocks until a frame is available or the connection closes.
    /// Must be cancel-safe: it is raced against the turn timer.
    async fn recv(&self) -> Result<String, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}

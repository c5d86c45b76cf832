//! WsTransport - WebSocket transport to the relay.
//!
//! One text frame carries one protocol event. The stream is split so a
//! pending `recv()` never blocks `send()`.

use super::{Transport, TransportError};
use async_trait::async_trait;
use dama_types::MAX_MESSAGE_SIZE;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for WsTransport.
#[derive(Clone, Debug)]
pub struct WsTransportConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for WsTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// WsTransport implements the Transport trait over a WebSocket.
///
/// # Example
///
/// ```ignore
/// let transport = WsTransport::new();
/// transport.connect("ws://127.0.0.1:3001/ws").await?;
/// transport.send(r#"{"event":"raumErstellen"}"#).await?;
/// let reply = transport.recv().await?;
/// ```
#[derive(Default)]
pub struct WsTransport {
    writer: Mutex<Option<SplitSink<WsStream, Message>>>,
    reader: Mutex<Option<SplitStream<WsStream>>>,
    connected: AtomicBool,
    config: WsTransportConfig,
}

impl WsTransport {
    /// Create a new WsTransport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new WsTransport with custom configuration.
    pub fn with_config(config: WsTransportConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    fn mark_closed(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// A socket that went away without a close frame is still a closed
/// connection, not a receive failure.
fn recv_error(error: WsError) -> TransportError {
    match error {
        WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Io(_)
        | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
            TransportError::ConnectionClosed
        }
        other => TransportError::ReceiveFailed(other.to_string()),
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        // Close existing connection if any
        self.close().await.ok();

        let (stream, _response) =
            tokio::time::timeout(self.config.connect_timeout, connect_async(address))
                .await
                .map_err(|_| TransportError::Timeout)?
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);
        *self.reader.lock().await = Some(source);
        self.connected.store(true, Ordering::SeqCst);

        tracing::debug!(%address, "Connected to relay");
        Ok(())
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        if frame.len() > MAX_MESSAGE_SIZE {
            return Err(TransportError::SendFailed(format!(
                "Message too large: {} > {}",
                frame.len(),
                MAX_MESSAGE_SIZE
            )));
        }

        let mut guard = self.writer.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;

        sink.send(Message::Text(frame.to_string()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn recv(&self) -> Result<String, TransportError> {
        let mut guard = self.reader.lock().await;
        let source = guard.as_mut().ok_or(TransportError::NotConnected)?;

        loop {
            match source.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes)
                        .map_err(|e| TransportError::ReceiveFailed(e.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.mark_closed();
                    return Err(TransportError::ConnectionClosed);
                }
                // Ping/pong are answered by tungstenite.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.mark_closed();
                    return Err(recv_error(e));
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.mark_closed();
        self.reader.lock().await.take();
        if let Some(mut sink) = self.writer.lock().await.take() {
            sink.close()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }
        Ok(())
    }
}

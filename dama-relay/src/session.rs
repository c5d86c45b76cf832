//! Per-connection session management.
//!
//! Each WebSocket gets a Session: a read loop on the connection's own task
//! and a writer task draining the connection's outbound queue.

use crate::error::{ProtocolError, ProtocolResult};
use crate::lobby::Outbound;
use crate::server::DamaRelay;
use axum::extract::ws::{Message, WebSocket};
use dama_types::{ClientMessage, ConnectionId, RelayMessage, MAX_MESSAGE_SIZE};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Reply to a client whose events are being rate limited.
pub const ERR_RATE_LIMITED: &str = "Zu viele Nachrichten";

/// A per-connection session.
pub struct Session {
    relay: Arc<DamaRelay>,
    conn: ConnectionId,
    remote: SocketAddr,
}

impl Session {
    /// Create a new session for a peer address.
    pub fn new(relay: Arc<DamaRelay>, remote: SocketAddr) -> Self {
        Self {
            relay,
            conn: ConnectionId::random(),
            remote,
        }
    }

    /// The relay-assigned identity of this connection.
    pub fn connection_id(&self) -> ConnectionId {
        self.conn
    }

    /// Run the session until the socket closes.
    pub async fn run(self, socket: WebSocket) {
        tracing::info!("New connection {:?} from {}", self.conn, self.remote);

        let (mut sink, mut stream) = socket.split();
        let mut outbound = self.relay.register(self.conn);
        let conn = self.conn;

        let writer = tokio::spawn(async move {
            while let Some(message) = outbound.recv().await {
                let text = match message.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("Failed to serialize {:?}: {}", message, e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::debug!("Write to {:?} failed: {}", conn, e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        while let Some(frame) = stream.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        self.reject(ProtocolError::InvalidMessage {
                            reason: "binary frame is not UTF-8".to_string(),
                        });
                        continue;
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Err(e) => {
                    tracing::debug!("Connection {:?} read error: {}", self.conn, e);
                    break;
                }
            };

            match self.inspect(&text) {
                Ok(message) => {
                    tracing::debug!("{:?} -> {:?}", self.conn, message);
                    self.relay.handle_message(self.conn, message).await;
                }
                Err(e) => self.reject(e),
            }
        }

        self.relay.unregister(self.conn).await;
        writer.abort();
        tracing::info!("Connection {:?} closed", self.conn);
    }

    /// Size check, rate limits and decoding for one inbound text frame.
    fn inspect(&self, text: &str) -> ProtocolResult<ClientMessage> {
        if text.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: text.len(),
                limit: MAX_MESSAGE_SIZE,
            });
        }

        if let Err(e) = self.relay.rate_limits().check_global() {
            return Err(ProtocolError::RateLimited {
                reason: e.to_string(),
            });
        }
        if let Err(e) = self.relay.rate_limits().check_message(self.conn) {
            return Err(ProtocolError::RateLimited {
                reason: e.to_string(),
            });
        }

        Ok(ClientMessage::from_json(text)?)
    }

    /// Drop a frame, counting it and telling the client when rate limited.
    fn reject(&self, error: ProtocolError) {
        let metrics = self.relay.metrics();
        match error {
            ProtocolError::RateLimited { reason } => {
                tracing::warn!("Rate limited {:?}: {}", self.conn, reason);
                metrics.rate_limit_hits.fetch_add(1, Ordering::Relaxed);
                self.relay.deliver(Outbound {
                    to: self.conn,
                    message: RelayMessage::Error(ERR_RATE_LIMITED.to_string()),
                });
            }
            other => {
                tracing::warn!("Dropping frame from {:?}: {}", self.conn, other);
                metrics.errors_total.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

//! Main DamaRelay server coordination.
//!
//! DamaRelay owns the lobby, the outbound channel of every live connection,
//! rate limiters and counters, and routes lobby output to sockets.

use crate::config::Config;
use crate::limits::RateLimits;
use crate::lobby::{Lobby, Outbound};
use dama_types::{ClientMessage, ConnectionId, RelayMessage};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};

/// Capacity of each connection's outbound queue.
pub const OUTBOUND_QUEUE: usize = 64;

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
/// Thread-safe via `AtomicU64`, no locks needed for incrementing.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total WebSocket connections accepted.
    pub connections_total: AtomicU64,
    /// Total matches started (matchmaking or room).
    pub games_started: AtomicU64,
    /// Total private rooms opened.
    pub rooms_created: AtomicU64,
    /// Total moves forwarded to a partner.
    pub moves_relayed: AtomicU64,
    /// Total rate limit rejections (connection + message + global).
    pub rate_limit_hits: AtomicU64,
    /// Total dropped frames (oversized, undecodable, undeliverable).
    pub errors_total: AtomicU64,
}

/// Main relay server.
pub struct DamaRelay {
    config: Config,
    /// All lobby mutations go through this one lock.
    lobby: Mutex<Lobby>,
    /// Outbound queue of every live connection.
    connections: DashMap<ConnectionId, mpsc::Sender<RelayMessage>>,
    /// Rate limiters for connections and messages.
    rate_limits: RateLimits,
    /// Operational metrics (counters).
    metrics: RelayMetrics,
}

impl std::fmt::Debug for DamaRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DamaRelay")
            .field("config", &self.config)
            .field("rate_limits", &self.rate_limits)
            .field("metrics", &self.metrics)
            .field("connections", &self.connections.len())
            .finish_non_exhaustive()
    }
}

impl DamaRelay {
    /// Create a new relay with the given config.
    pub fn new(config: Config) -> Self {
        let rate_limits = RateLimits::new(&config.limits);
        let lobby = Mutex::new(Lobby::new(config.rooms.max_open_rooms));
        Self {
            config,
            lobby,
            connections: DashMap::new(),
            rate_limits,
            metrics: RelayMetrics::default(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the rate limiters.
    pub fn rate_limits(&self) -> &RateLimits {
        &self.rate_limits
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Register a new connection and return the receiving end of its
    /// outbound queue.
    pub fn register(&self, conn: ConnectionId) -> mpsc::Receiver<RelayMessage> {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        self.connections.insert(conn, tx);
        tracing::debug!(
            "Registered {:?} (total: {})",
            conn,
            self.connections.len()
        );
        rx
    }

    /// Drop a connection: free its lobby state and tell its partner.
    pub async fn unregister(&self, conn: ConnectionId) {
        self.connections.remove(&conn);
        let out = self.lobby.lock().await.disconnect(conn);
        self.dispatch(out);
        tracing::debug!(
            "Unregistered {:?} (remaining: {})",
            conn,
            self.connections.len()
        );
    }

    /// Apply one client event to the lobby and deliver the results.
    pub async fn handle_message(&self, conn: ConnectionId, message: ClientMessage) {
        let out = {
            let mut lobby = self.lobby.lock().await;
            match message {
                ClientMessage::SeekGame => {
                    let out = lobby.seek(conn);
                    self.count_started(&out);
                    out
                }
                ClientMessage::CreateRoom => {
                    let out = lobby.create_room(conn, &mut rand::thread_rng(), Instant::now());
                    if out
                        .iter()
                        .any(|o| matches!(o.message, RelayMessage::RoomCreated(_)))
                    {
                        self.metrics.rooms_created.fetch_add(1, Ordering::Relaxed);
                    }
                    out
                }
                ClientMessage::JoinRoom(code) => {
                    let out = lobby.join(conn, &code);
                    self.count_started(&out);
                    out
                }
                ClientMessage::Move(payload) => {
                    let out = lobby.relay_move(conn, payload);
                    if !out.is_empty() {
                        self.metrics.moves_relayed.fetch_add(1, Ordering::Relaxed);
                    }
                    out
                }
            }
        };
        self.dispatch(out);
    }

    /// Queue one message for a connection.
    ///
    /// Fire-and-forget: a full or closed queue drops the message.
    pub fn deliver(&self, outbound: Outbound) {
        let Some(tx) = self.connections.get(&outbound.to) else {
            tracing::debug!("No live connection for {:?}, dropping", outbound.to);
            return;
        };
        match tx.try_send(outbound.message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Outbound queue full for {:?}, dropping", outbound.to);
                self.metrics.errors_total.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Outbound queue closed for {:?}", outbound.to);
            }
        }
    }

    /// Delete rooms older than the configured TTL.
    pub async fn expire_rooms(&self) -> usize {
        let ttl = Duration::from_secs(self.config.rooms.ttl_secs);
        self.lobby.lock().await.expire_rooms(Instant::now(), ttl)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Snapshot of lobby gauges: (waiting players, open rooms, active matches).
    pub async fn lobby_stats(&self) -> LobbyStats {
        let lobby = self.lobby.lock().await;
        LobbyStats {
            waiting_players: lobby.waiting_players(),
            open_rooms: lobby.open_rooms(),
            active_matches: lobby.active_matches(),
        }
    }

    fn dispatch(&self, out: Vec<Outbound>) {
        for outbound in out {
            self.deliver(outbound);
        }
    }

    fn count_started(&self, out: &[Outbound]) {
        if out
            .iter()
            .any(|o| matches!(o.message, RelayMessage::GameStarted))
        {
            self.metrics.games_started.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Lobby gauges for health and metrics endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LobbyStats {
    /// Connections in the matchmaking slot.
    pub waiting_players: usize,
    /// Rooms waiting for a second player.
    pub open_rooms: usize,
    /// Paired matches.
    pub active_matches: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dama_types::{MovePayload, Player};
    use serde_json::json;

    fn relay() -> DamaRelay {
        DamaRelay::new(Config::default())
    }

    fn drain(rx: &mut mpsc::Receiver<RelayMessage>) -> Vec<RelayMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    #[tokio::test]
    async fn register_and_unregister() {
        let relay = relay();
        let conn = ConnectionId::random();

        let _rx = relay.register(conn);
        assert_eq!(relay.connection_count(), 1);

        relay.unregister(conn).await;
        assert_eq!(relay.connection_count(), 0);
    }

    #[tokio::test]
    async fn seek_pairs_and_counts() {
        let relay = relay();
        let a = ConnectionId::random();
        let b = ConnectionId::random();
        let mut rx_a = relay.register(a);
        let mut rx_b = relay.register(b);

        relay.handle_message(a, ClientMessage::SeekGame).await;
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(relay.lobby_stats().await.waiting_players, 1);

        relay.handle_message(b, ClientMessage::SeekGame).await;
        assert_eq!(
            drain(&mut rx_a),
            vec![
                RelayMessage::PlayerAssigned(Player::Dark),
                RelayMessage::GameStarted
            ]
        );
        assert_eq!(
            drain(&mut rx_b),
            vec![
                RelayMessage::PlayerAssigned(Player::Light),
                RelayMessage::GameStarted
            ]
        );
        assert_eq!(relay.metrics().games_started.load(Ordering::Relaxed), 1);
        assert_eq!(
            relay.lobby_stats().await,
            LobbyStats {
                waiting_players: 0,
                open_rooms: 0,
                active_matches: 1
            }
        );
    }

    #[tokio::test]
    async fn move_forwarded_and_partner_told_on_leave() {
        let relay = relay();
        let a = ConnectionId::random();
        let b = ConnectionId::random();
        let mut rx_a = relay.register(a);
        let mut rx_b = relay.register(b);
        relay.handle_message(a, ClientMessage::SeekGame).await;
        relay.handle_message(b, ClientMessage::SeekGame).await;
        drain(&mut rx_a);
        drain(&mut rx_b);

        let payload = MovePayload::from_value(json!({
            "von": {"row": 2, "col": 1},
            "nach": {"row": 3, "col": 2}
        }));
        relay
            .handle_message(a, ClientMessage::Move(payload.clone()))
            .await;
        assert_eq!(drain(&mut rx_b), vec![RelayMessage::OpponentMove(payload)]);
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(relay.metrics().moves_relayed.load(Ordering::Relaxed), 1);

        relay.unregister(a).await;
        assert_eq!(drain(&mut rx_b), vec![RelayMessage::OpponentLeft]);
        assert_eq!(relay.lobby_stats().await.active_matches, 0);
    }

    #[tokio::test]
    async fn room_flow_counts_rooms() {
        let relay = relay();
        let creator = ConnectionId::random();
        let joiner = ConnectionId::random();
        let mut rx_c = relay.register(creator);
        let mut rx_j = relay.register(joiner);

        relay.handle_message(creator, ClientMessage::CreateRoom).await;
        let code = match drain(&mut rx_c).pop() {
            Some(RelayMessage::RoomCreated(code)) => code,
            other => panic!("expected RoomCreated, got {:?}", other),
        };
        assert_eq!(relay.metrics().rooms_created.load(Ordering::Relaxed), 1);

        relay
            .handle_message(joiner, ClientMessage::JoinRoom(code.to_string()))
            .await;
        assert_eq!(drain(&mut rx_j).len(), 2);
        assert_eq!(drain(&mut rx_c).len(), 2);
        assert_eq!(relay.metrics().games_started.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn full_queue_drops_and_counts() {
        let relay = relay();
        let conn = ConnectionId::random();
        let _rx = relay.register(conn);

        for _ in 0..OUTBOUND_QUEUE + 3 {
            relay.deliver(Outbound {
                to: conn,
                message: RelayMessage::GameStarted,
            });
        }
        assert_eq!(relay.metrics().errors_total.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn deliver_to_unknown_connection_is_noop() {
        let relay = relay();
        relay.deliver(Outbound {
            to: ConnectionId::random(),
            message: RelayMessage::GameStarted,
        });
        assert_eq!(relay.metrics().errors_total.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn fresh_rooms_survive_expiry() {
        let relay = relay();
        let conn = ConnectionId::random();
        let _rx = relay.register(conn);
        relay.handle_message(conn, ClientMessage::CreateRoom).await;

        assert_eq!(relay.expire_rooms().await, 0);
        assert_eq!(relay.lobby_stats().await.open_rooms, 1);
    }
}

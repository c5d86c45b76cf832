//! Health check endpoint.

use crate::server::DamaRelay;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Global start time for uptime calculation.
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call once at startup).
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Number of live WebSocket connections.
    pub connections: usize,
    /// Connections waiting in matchmaking.
    pub waiting_players: usize,
    /// Rooms waiting for a second player.
    pub open_rooms: usize,
    /// Paired matches.
    pub active_matches: usize,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Health check handler.
pub async fn health_handler(Extension(relay): Extension<Arc<DamaRelay>>) -> Json<HealthStatus> {
    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0);
    let lobby = relay.lobby_stats().await;

    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connections: relay.connection_count(),
        waiting_players: lobby.waiting_players,
        open_rooms: lobby.open_rooms,
        active_matches: lobby.active_matches,
        uptime_seconds: uptime,
    })
}

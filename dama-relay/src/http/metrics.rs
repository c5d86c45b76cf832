//! Prometheus metrics endpoint.

use crate::server::DamaRelay;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
/// Includes both gauges (current state) and counters (monotonic since startup).
pub async fn metrics_handler(Extension(relay): Extension<Arc<DamaRelay>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        render(&relay).await,
    )
}

async fn render(relay: &DamaRelay) -> String {
    let m = relay.metrics();

    // Gauges
    let connections = relay.connection_count();
    let lobby = relay.lobby_stats().await;
    let waiting = lobby.waiting_players;
    let rooms = lobby.open_rooms;
    let matches = lobby.active_matches;
    let limiter_keys =
        relay.rate_limits().connection_keys_count() + relay.rate_limits().message_keys_count();

    // Counters
    let conns_total = m.connections_total.load(Ordering::Relaxed);
    let games = m.games_started.load(Ordering::Relaxed);
    let rooms_total = m.rooms_created.load(Ordering::Relaxed);
    let moves = m.moves_relayed.load(Ordering::Relaxed);
    let rate_limits = m.rate_limit_hits.load(Ordering::Relaxed);
    let errors = m.errors_total.load(Ordering::Relaxed);

    format!(
        r#"# HELP dama_relay_connections_active Number of live WebSocket connections
# TYPE dama_relay_connections_active gauge
dama_relay_connections_active {connections}

# HELP dama_relay_waiting_players Connections waiting in matchmaking
# TYPE dama_relay_waiting_players gauge
dama_relay_waiting_players {waiting}

# HELP dama_relay_open_rooms Private rooms waiting for a second player
# TYPE dama_relay_open_rooms gauge
dama_relay_open_rooms {rooms}

# HELP dama_relay_matches_active Paired matches
# TYPE dama_relay_matches_active gauge
dama_relay_matches_active {matches}

# HELP dama_relay_rate_limiter_keys Keys tracked by the rate limiters
# TYPE dama_relay_rate_limiter_keys gauge
dama_relay_rate_limiter_keys {limiter_keys}

# HELP dama_relay_info Server information
# TYPE dama_relay_info gauge
dama_relay_info{{version="{version}"}} 1

# HELP dama_relay_connections_total Total connections accepted
# TYPE dama_relay_connections_total counter
dama_relay_connections_total {conns_total}

# HELP dama_relay_games_started_total Total matches started
# TYPE dama_relay_games_started_total counter
dama_relay_games_started_total {games}

# HELP dama_relay_rooms_created_total Total private rooms opened
# TYPE dama_relay_rooms_created_total counter
dama_relay_rooms_created_total {rooms_total}

# HELP dama_relay_moves_relayed_total Total moves forwarded to a partner
# TYPE dama_relay_moves_relayed_total counter
dama_relay_moves_relayed_total {moves}

# HELP dama_relay_rate_limit_hits_total Total rate limit rejections
# TYPE dama_relay_rate_limit_hits_total counter
dama_relay_rate_limit_hits_total {rate_limits}

# HELP dama_relay_errors_total Total dropped frames
# TYPE dama_relay_errors_total counter
dama_relay_errors_total {errors}
"#,
        version = env!("CARGO_PKG_VERSION"),
    )
}

//! WebSocket upgrade handler for the `/ws` route.
//!
//! Applies the per-address connection limit, then hands the socket to a
//! [`Session`].

use crate::server::DamaRelay;
use crate::session::Session;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ConnectInfo;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use dama_types::MAX_MESSAGE_SIZE;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Largest frame the WebSocket layer will buffer.
///
/// Frames between this and [`MAX_MESSAGE_SIZE`] reach the session and are
/// dropped there, so the connection survives them.
pub const MAX_FRAME_SIZE: usize = 16 * MAX_MESSAGE_SIZE;

/// Accept a WebSocket upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Extension(relay): Extension<Arc<DamaRelay>>,
) -> Response {
    // Rate limit check: prevent connection flooding from a single address
    if let Err(e) = relay.rate_limits().check_connection(remote.ip()) {
        tracing::warn!("Connection rate limited for {}: {}", remote, e);
        relay.metrics().rate_limit_hits.fetch_add(1, Ordering::Relaxed);
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }

    relay.metrics().connections_total.fetch_add(1, Ordering::Relaxed);

    ws.max_message_size(MAX_FRAME_SIZE)
        .max_frame_size(MAX_FRAME_SIZE)
        .on_upgrade(move |socket| Session::new(relay, remote).run(socket))
}

//! Background cleanup task for stale rooms and rate limiter state.
//!
//! Runs periodically to delete rooms nobody joined within their TTL and to
//! evict idle rate limiter keys.

use crate::config::CleanupConfig;
use crate::server::DamaRelay;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Spawn a background cleanup task.
///
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_task(
    relay: Arc<DamaRelay>,
    config: CleanupConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if !config.enabled {
            tracing::info!("Cleanup task disabled");
            return;
        }

        let interval_secs = config.interval_secs;
        tracing::info!("Cleanup task started (interval: {}s)", interval_secs);

        let mut timer = interval(Duration::from_secs(interval_secs));

        loop {
            timer.tick().await;
            run_once(&relay).await;
        }
    })
}

/// One cleanup pass. Returns the number of rooms deleted.
pub async fn run_once(relay: &DamaRelay) -> usize {
    let deleted = relay.expire_rooms().await;
    if deleted > 0 {
        tracing::info!("Cleanup: deleted {} stale rooms", deleted);
    } else {
        tracing::debug!("Cleanup: no stale rooms");
    }

    relay.rate_limits().shrink();
    deleted
}

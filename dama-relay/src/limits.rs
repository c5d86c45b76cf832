//! Rate limiting for dama-relay.
//!
//! Provides protection against connection flooding and message spam:
//! - **IP address** for WebSocket upgrade attempts
//! - **ConnectionId** for inbound protocol events
//! - one global cap on inbound events across all connections
//!
//! The keyed limiters use governor backed by DashMap.

use crate::config::LimitsConfig;
use dama_types::ConnectionId;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Type alias for a keyed rate limiter using DashMap.
type KeyedLimiter<K> = RateLimiter<
    K,
    dashmap::DashMap<K, InMemoryState>,
    DefaultClock,
    NoOpMiddleware<governor::clock::QuantaInstant>,
>;

/// Type alias for a direct (non-keyed) rate limiter.
type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Zero is rejected by `Config::validate`; treat a stray zero as one.
fn at_least_one(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
}

/// Rate limiters for the relay server.
#[derive(Clone)]
pub struct RateLimits {
    /// Limits WebSocket upgrades per client IP.
    connection_limiter: Arc<KeyedLimiter<IpAddr>>,

    /// Limits inbound events per connection.
    message_limiter: Arc<KeyedLimiter<ConnectionId>>,

    /// Caps aggregate inbound events even if each client is within limits.
    global_limiter: Arc<DirectLimiter>,
}

impl std::fmt::Debug for RateLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimits")
            .field("connection_limiter", &"KeyedLimiter<IpAddr>")
            .field("message_limiter", &"KeyedLimiter<ConnectionId>")
            .field("global_limiter", &"DirectLimiter")
            .finish()
    }
}

impl RateLimits {
    /// Create rate limiters from configuration.
    pub fn new(config: &LimitsConfig) -> Self {
        // e.g. 10 connections/minute = 1 every 6 seconds after the burst
        let connection_quota = Quota::per_minute(at_least_one(config.connections_per_ip));
        let message_quota = Quota::per_minute(at_least_one(config.messages_per_minute));
        let global_quota = Quota::per_second(at_least_one(config.global_messages_per_second));

        Self {
            connection_limiter: Arc::new(RateLimiter::keyed(connection_quota)),
            message_limiter: Arc::new(RateLimiter::keyed(message_quota)),
            global_limiter: Arc::new(RateLimiter::direct(global_quota)),
        }
    }

    /// Check if a connection attempt from `ip` is allowed.
    pub fn check_connection(&self, ip: IpAddr) -> Result<(), RateLimitError> {
        self.connection_limiter
            .check_key(&ip)
            .map_err(|_| RateLimitError::ConnectionLimitExceeded)
    }

    /// Check if an inbound event from `connection` is allowed.
    pub fn check_message(&self, connection: ConnectionId) -> Result<(), RateLimitError> {
        self.message_limiter
            .check_key(&connection)
            .map_err(|_| RateLimitError::MessageLimitExceeded)
    }

    /// Check if the global event rate is within limits.
    pub fn check_global(&self) -> Result<(), RateLimitError> {
        self.global_limiter
            .check()
            .map_err(|_| RateLimitError::GlobalLimitExceeded)
    }

    /// Get the number of tracked connection keys (for metrics).
    pub fn connection_keys_count(&self) -> usize {
        self.connection_limiter.len()
    }

    /// Get the number of tracked message keys (for metrics).
    pub fn message_keys_count(&self) -> usize {
        self.message_limiter.len()
    }

    /// Evict stale entries from the keyed rate limiter DashMaps.
    ///
    /// `retain_recent()` removes entries whose cells have fully recharged
    /// (idle or departed clients). Called periodically from the cleanup task.
    pub fn shrink(&self) {
        self.connection_limiter.retain_recent();
        self.message_limiter.retain_recent();
    }
}

/// Rate limit error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    /// Too many connection attempts from this address.
    #[error("connection rate limit exceeded")]
    ConnectionLimitExceeded,
    /// Too many events from this connection.
    #[error("message rate limit exceeded")]
    MessageLimitExceeded,
    /// Global event rate exceeded across all clients.
    #[error("global rate limit exceeded")]
    GlobalLimitExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn config(connections: u32, messages: u32, global: u32) -> LimitsConfig {
        LimitsConfig {
            connections_per_ip: connections,
            messages_per_minute: messages,
            global_messages_per_second: global,
        }
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn create_rate_limits() {
        let limits = RateLimits::new(&LimitsConfig::default());
        assert_eq!(limits.connection_keys_count(), 0);
        assert_eq!(limits.message_keys_count(), 0);
    }

    #[test]
    fn connection_limit_allows_within_quota() {
        let limits = RateLimits::new(&config(5, 100, 1000));

        // First 5 should succeed
        for _ in 0..5 {
            assert!(limits.check_connection(ip(1)).is_ok());
        }

        // 6th should fail
        assert_eq!(
            limits.check_connection(ip(1)),
            Err(RateLimitError::ConnectionLimitExceeded)
        );
    }

    #[test]
    fn message_limit_allows_within_quota() {
        let limits = RateLimits::new(&config(100, 5, 1000));
        let conn = ConnectionId::random();

        for _ in 0..5 {
            assert!(limits.check_message(conn).is_ok());
        }

        assert_eq!(
            limits.check_message(conn),
            Err(RateLimitError::MessageLimitExceeded)
        );
    }

    #[test]
    fn different_keys_have_independent_limits() {
        let limits = RateLimits::new(&config(2, 2, 1000));

        let a = ConnectionId::random();
        let b = ConnectionId::random();

        // A uses its quota
        assert!(limits.check_message(a).is_ok());
        assert!(limits.check_message(a).is_ok());
        assert!(limits.check_message(a).is_err());

        // B still has full quota
        assert!(limits.check_message(b).is_ok());
        assert!(limits.check_message(b).is_ok());
        assert!(limits.check_message(b).is_err());

        // Same for addresses
        assert!(limits.check_connection(ip(1)).is_ok());
        assert!(limits.check_connection(ip(1)).is_ok());
        assert!(limits.check_connection(ip(1)).is_err());
        assert!(limits.check_connection(ip(2)).is_ok());
    }

    #[test]
    fn global_rate_limiter_rejects_excess() {
        let limits = RateLimits::new(&config(100, 100, 5));

        for _ in 0..5 {
            assert!(limits.check_global().is_ok());
        }

        assert_eq!(
            limits.check_global(),
            Err(RateLimitError::GlobalLimitExceeded)
        );
    }

    #[test]
    fn rate_limits_are_debug() {
        let limits = RateLimits::new(&LimitsConfig::default());
        let debug = format!("{:?}", limits);
        assert!(debug.contains("RateLimits"));
    }

    #[test]
    fn rate_limit_error_display() {
        assert_eq!(
            RateLimitError::ConnectionLimitExceeded.to_string(),
            "connection rate limit exceeded"
        );
        assert_eq!(
            RateLimitError::GlobalLimitExceeded.to_string(),
            "global rate limit exceeded"
        );
    }

    #[test]
    fn shrink_does_not_panic() {
        let limits = RateLimits::new(&LimitsConfig::default());
        let _ = limits.check_connection(ip(1));
        let _ = limits.check_message(ConnectionId::random());
        assert!(limits.connection_keys_count() > 0);

        // Freshly used entries may or may not be evicted depending on timing
        limits.shrink();
    }
}

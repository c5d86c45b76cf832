//! Configuration loading for dama-relay.
//!
//! Configuration is loaded from a TOML file (default: `relay.toml`).
//! Every section and field is optional.

use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for dama-relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Rate limiting configuration.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Private room configuration.
    #[serde(default)]
    pub rooms: RoomsConfig,
    /// HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
    /// Cleanup task configuration.
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP/WebSocket listener (default: 0.0.0.0:3001).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum new connections per IP address per minute (default: 10).
    #[serde(default = "default_connections_per_ip")]
    pub connections_per_ip: u32,
    /// Maximum messages per connection per minute (default: 120).
    #[serde(default = "default_messages_per_minute")]
    pub messages_per_minute: u32,
    /// Maximum messages per second across all connections (default: 1000).
    #[serde(default = "default_global_messages_per_second")]
    pub global_messages_per_second: u32,
}

/// Private room configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomsConfig {
    /// Seconds an unjoined room stays open (default: 3600).
    #[serde(default = "default_room_ttl")]
    pub ttl_secs: u64,
    /// Maximum number of rooms waiting for a second player (default: 10000).
    #[serde(default = "default_max_open_rooms")]
    pub max_open_rooms: usize,
}

/// HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Enable metrics endpoint (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

/// Cleanup task configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Cleanup interval in seconds (default: 60).
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
    /// Enable cleanup task (default: true).
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_connections_per_ip() -> u32 {
    10
}

fn default_messages_per_minute() -> u32 {
    120
}

fn default_global_messages_per_second() -> u32 {
    1000
}

fn default_room_ttl() -> u64 {
    60 * 60 // 1 hour
}

fn default_max_open_rooms() -> usize {
    10_000
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_cleanup_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            connections_per_ip: default_connections_per_ip(),
            messages_per_minute: default_messages_per_minute(),
            global_messages_per_second: default_global_messages_per_second(),
        }
    }
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_room_ttl(),
            max_open_rooms: default_max_open_rooms(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_cleanup_interval(),
            enabled: default_cleanup_enabled(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds
    /// values the relay cannot run with.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a limiter or timer meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("limits.connections_per_ip", self.limits.connections_per_ip == 0),
            ("limits.messages_per_minute", self.limits.messages_per_minute == 0),
            (
                "limits.global_messages_per_second",
                self.limits.global_messages_per_second == 0,
            ),
            ("rooms.ttl_secs", self.rooms.ttl_secs == 0),
            ("cleanup.interval_secs", self.cleanup.interval_secs == 0),
        ];
        for (field, is_zero) in checks {
            if is_zero {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted field name.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.  It
//! can be built from defaults, from a TOML file (see
//! [`RelayConfig::load`](crate::domain::RelayConfig::load)), and then
//! overridden field by field from the command line in `main.rs`.
//!
//! Every field carries a `#[serde(default = ...)]` so a partial file, or an
//! empty one, still yields a complete configuration:
//!
//! ```toml
//! bind_addr = "0.0.0.0:8080"
//! ws_path = "/conn"
//!
//! [session]
//! role = "server"
//! queue_capacity = 32
//! close_deadline_ms = 1000
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ras_core::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed correctly but is not usable.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Capacity of each of the two per-session queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// How long the outbound pump waits for the close control frame to go out.
pub const DEFAULT_CLOSE_DEADLINE_MS: u64 = 1_000;

/// Path on which WebSocket upgrades are accepted.
pub const DEFAULT_WS_PATH: &str = "/conn";

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_ws_path() -> String {
    DEFAULT_WS_PATH.to_string()
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_close_deadline_ms() -> u64 {
    DEFAULT_CLOSE_DEADLINE_MS
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// Per-session settings shared by every connection the relay accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Which end of the link the codec works for.  The relay is normally the
    /// server; `client` is useful when driving a RAS server from Rust.
    #[serde(default)]
    pub role: Role,

    /// Capacity of the receive queue and of the send queue.  A full queue
    /// suspends its producer; there is no timeout.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Deadline for sending the close control frame, in milliseconds.
    #[serde(default = "default_close_deadline_ms")]
    pub close_deadline_ms: u64,
}

impl SessionConfig {
    /// Returns the close-frame deadline as a [`Duration`].
    pub fn close_deadline(&self) -> Duration {
        Duration::from_millis(self.close_deadline_ms)
    }

    /// Checks the values that serde cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the queue capacity is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role: Role::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            close_deadline_ms: DEFAULT_CLOSE_DEADLINE_MS,
        }
    }
}

/// All runtime configuration for the relay.
///
/// # Example
///
/// ```rust
/// use ras_relay::domain::RelayConfig;
///
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.ws_path, "/conn");
/// assert_eq!(cfg.session.queue_capacity, 32);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayConfig {
    /// Address and port the WebSocket listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// HTTP path on which WebSocket upgrades are accepted.  Requests for any
    /// other path are answered with 404.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    #[serde(default)]
    pub session: SessionConfig,
}

impl RelayConfig {
    /// Parses a configuration from TOML text, filling absent fields with
    /// defaults.  The result is not validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML or a value
    /// has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Checks every field for values that would make the relay unusable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ws_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "ws_path",
                reason: format!("'{}' must begin with '/'", self.ws_path),
            });
        }
        self.session.validate()
    }
}

impl Default for RelayConfig {
    /// | Field                      | Default          |
    /// |----------------------------|------------------|
    /// | bind_addr                  | `127.0.0.1:8080` |
    /// | ws_path                    | `/conn`          |
    /// | session.role               | `server`         |
    /// | session.queue_capacity     | 32               |
    /// | session.close_deadline_ms  | 1000             |
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            ws_path: default_ws_path(),
            session: SessionConfig::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

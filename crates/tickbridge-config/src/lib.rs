//! Shared configuration for the tickbridge bridge and its command-line client.
//!
//! Values are layered by `ortho_config`: built-in defaults, then an optional
//! configuration file (`--config-path`), then `TICKBRIDGE_*` environment
//! variables, then command-line flags.

mod defaults;
mod logging;
mod socket;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_BATCH_LIMIT, DEFAULT_COMMAND_LOG_CAPACITY, DEFAULT_HOST, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT_SEARCH_SPAN, DEFAULT_READ_TIMEOUT_MS, DEFAULT_TCP_PORT,
    DEFAULT_TICK_INTERVAL_MS, DEFAULT_WAIT_POLL_INTERVAL_MS, default_log_filter,
    default_log_filter_string, default_log_format, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by `tickbridged` and `tickbridge`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "TICKBRIDGE")]
pub struct Config {
    /// Endpoint the bridge listens on and the client connects to.
    #[serde(default = "defaults::default_socket_endpoint")]
    pub bridge_socket: SocketEndpoint,
    /// Successive ports tried when the configured TCP port is in use.
    #[serde(default = "defaults::default_port_search_span")]
    pub port_search_span: u16,
    /// `tracing_subscriber::EnvFilter` expression.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Period of the reference host loop.
    #[serde(default = "defaults::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Maximum number of targets a single batch request may name.
    #[serde(default = "defaults::default_batch_limit")]
    pub batch_limit: usize,
    /// Entries retained by the diagnostics command log.
    #[serde(default = "defaults::default_command_log_capacity")]
    pub command_log_capacity: usize,
    /// Largest request body accepted before the request is rejected.
    #[serde(default = "defaults::default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Read timeout applied to each accepted connection.
    #[serde(default = "defaults::default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Poll period used by handlers that wait for the host to become idle.
    #[serde(default = "defaults::default_wait_poll_interval_ms")]
    pub wait_poll_interval_ms: u64,
    /// Whether the reference host starts with a camera and a light.
    #[serde(default = "defaults::default_seed_scene")]
    pub seed_default_scene: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_socket: default_socket_endpoint(),
            port_search_span: defaults::default_port_search_span(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            tick_interval_ms: defaults::default_tick_interval_ms(),
            batch_limit: defaults::default_batch_limit(),
            command_log_capacity: defaults::default_command_log_capacity(),
            max_body_bytes: defaults::default_max_body_bytes(),
            read_timeout_ms: defaults::default_read_timeout_ms(),
            wait_poll_interval_ms: defaults::default_wait_poll_interval_ms(),
            seed_default_scene: defaults::default_seed_scene(),
        }
    }
}

impl Config {
    /// Endpoint the bridge listens on.
    #[must_use]
    pub const fn bridge_socket(&self) -> &SocketEndpoint {
        &self.bridge_socket
    }

    /// Endpoints tried in order when binding or discovering the bridge.
    #[must_use]
    pub fn socket_candidates(&self) -> Vec<SocketEndpoint> {
        self.bridge_socket.port_candidates(self.port_search_span)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Host loop period.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Upper bound on targets per batch.
    #[must_use]
    pub const fn batch_limit(&self) -> usize {
        self.batch_limit
    }

    /// Command log capacity.
    #[must_use]
    pub const fn command_log_capacity(&self) -> usize {
        self.command_log_capacity
    }

    /// Largest accepted request body.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Per-connection read timeout.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Poll period for blocking wait handlers.
    #[must_use]
    pub const fn wait_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms)
    }

    /// Whether the reference host seeds its default scene.
    #[must_use]
    pub const fn seed_default_scene(&self) -> bool {
        self.seed_default_scene
    }

    /// Rejects values that would leave the bridge unable to make progress.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] naming the first offending field.
    pub const fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.batch_limit == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "batch_limit",
            });
        }
        if self.command_log_capacity == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "command_log_capacity",
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "tick_interval_ms",
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigValidationError::ZeroValue {
                field: "max_body_bytes",
            });
        }
        Ok(())
    }
}

/// Errors raised by [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    /// A field that must be positive was zero.
    #[error("configuration field '{field}' must be greater than zero")]
    ZeroValue {
        /// Name of the offending field.
        field: &'static str,
    },
}

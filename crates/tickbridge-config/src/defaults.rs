use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Loopback host the bridge binds by default.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// First TCP port tried by the bridge and by client discovery.
pub const DEFAULT_TCP_PORT: u16 = 8080;

/// Number of additional ports tried when the default one is taken.
pub const DEFAULT_PORT_SEARCH_SPAN: u16 = 10;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Host tick period of the reference host loop, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Hard upper bound on the number of targets named by one batch request.
pub const DEFAULT_BATCH_LIMIT: usize = 1000;

/// Number of command log entries retained for diagnostics.
pub const DEFAULT_COMMAND_LOG_CAPACITY: usize = 100;

/// Largest request body accepted by the acceptor.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Per-connection socket read timeout, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;

/// Sleep between polls inside blocking wait handlers, in milliseconds.
pub const DEFAULT_WAIT_POLL_INTERVAL_MS: u64 = 25;

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Computes the default socket endpoint for the bridge.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST, DEFAULT_TCP_PORT)
}

pub(crate) const fn default_port_search_span() -> u16 {
    DEFAULT_PORT_SEARCH_SPAN
}

pub(crate) const fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

pub(crate) const fn default_batch_limit() -> usize {
    DEFAULT_BATCH_LIMIT
}

pub(crate) const fn default_command_log_capacity() -> usize {
    DEFAULT_COMMAND_LOG_CAPACITY
}

pub(crate) const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

pub(crate) const fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

pub(crate) const fn default_wait_poll_interval_ms() -> u64 {
    DEFAULT_WAIT_POLL_INTERVAL_MS
}

pub(crate) const fn default_seed_scene() -> bool {
    true
}

//! State a handler may touch while it runs.

use std::time::Duration;

use tickbridge_config::Config;

use crate::diagnostics::BridgeStats;
use crate::host::Host;

/// Handler-visible tunables, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Maximum targets per batch request.
    pub batch_limit: usize,
    /// Sleep between busy-signal polls in `editor/wait`.
    pub wait_poll_interval: Duration,
    /// Wait budget when a request names none.
    pub default_wait_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            batch_limit: 1000,
            wait_poll_interval: Duration::from_millis(25),
            default_wait_timeout: Duration::from_millis(10_000),
        }
    }
}

impl BridgeSettings {
    /// Settings taken from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_limit: config.batch_limit(),
            wait_poll_interval: config.wait_poll_interval(),
            ..Self::default()
        }
    }
}

/// Exclusive access to host state for one unit of work.
///
/// Only the coordinator builds a context, so holding one is proof that no
/// other unit is executing.
#[derive(Debug)]
pub struct HandlerContext<'a> {
    /// Host graph.
    pub host: &'a mut Host,
    /// Counters and command log.
    pub stats: &'a mut BridgeStats,
    /// Tunables.
    pub settings: &'a BridgeSettings,
}

impl<'a> HandlerContext<'a> {
    /// Bundles the parts of a context.
    pub fn new(host: &'a mut Host, stats: &'a mut BridgeStats, settings: &'a BridgeSettings) -> Self {
        Self {
            host,
            stats,
            settings,
        }
    }
}

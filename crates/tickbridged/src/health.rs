//! Structured health reporting for bridge lifecycle events.

use std::sync::Arc;

use tickbridge_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;
use crate::dispatch::BridgeError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the acceptor is bound. `endpoint` is the address in use,
    /// which differs from the configured one after a port search.
    fn listener_bound(&self, endpoint: &SocketEndpoint);

    /// Invoked when a unit of work faulted inside the coordinator.
    fn coordinator_fault(&self, endpoint: &str, error: &BridgeError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn listener_bound(&self, endpoint: &SocketEndpoint) {
        (**self).listener_bound(endpoint);
    }

    fn coordinator_fault(&self, endpoint: &str, error: &BridgeError) {
        (**self).coordinator_fault(endpoint, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting bridge bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            socket = %config.bridge_socket(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            batch_limit = config.batch_limit(),
            "bridge bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "bridge bootstrap failed"
        );
    }

    fn listener_bound(&self, endpoint: &SocketEndpoint) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_bound",
            endpoint = %endpoint,
            "bridge accepting connections"
        );
    }

    fn coordinator_fault(&self, endpoint: &str, error: &BridgeError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "coordinator_fault",
            endpoint,
            error = %error,
            "unit of work faulted"
        );
    }
}

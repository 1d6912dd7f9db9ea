//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::{Mutex, PoisonError};

use tickbridge_config::{Config, SocketEndpoint};

use crate::bootstrap::BootstrapError;
use crate::dispatch::BridgeError;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The acceptor bound an endpoint.
    ListenerBound(SocketEndpoint),
    /// A unit of work faulted inside the coordinator.
    CoordinatorFault { endpoint: String, kind: String },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_bound(&self, endpoint: &SocketEndpoint) {
        self.record(HealthEvent::ListenerBound(endpoint.clone()));
    }

    fn coordinator_fault(&self, endpoint: &str, error: &BridgeError) {
        self.record(HealthEvent::CoordinatorFault {
            endpoint: endpoint.to_owned(),
            kind: error.kind().to_owned(),
        });
    }
}

//! Failures of the reference host, split by the phase that produced them.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Why the reference host exited early or uncleanly.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Signal handlers could not be installed, so the loop could never stop.
    #[error("failed to arm shutdown signal: {0}")]
    Signals(#[from] ShutdownError),
    /// Configuration could not be loaded or validated.
    #[error("bridge bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    /// No candidate endpoint could be bound.
    #[error("bridge could not listen on {configured}: {source}")]
    Bind {
        /// Endpoint named in configuration.
        configured: String,
        /// Error from the last candidate tried.
        #[source]
        source: ListenerError,
    },
    /// The host loop ended but the acceptor did not stop cleanly.
    #[error("bridge at {endpoint} failed to stop: {source}")]
    Stop {
        /// Endpoint the bridge was bound to.
        endpoint: String,
        /// Listener failure.
        #[source]
        source: ListenerError,
    },
}

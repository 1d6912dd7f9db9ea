//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("failed to resolve bridge address {endpoint}: {source}")]
    Resolve { endpoint: String, source: io::Error },
    #[error("failed to connect to bridge at {endpoint}: {source}")]
    Connect { endpoint: String, source: io::Error },
    #[error("no bridge is listening on {tried}")]
    NoBridge { tried: String },
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    #[error("failed to read request body: {0}")]
    ReadBody(io::Error),
    #[error("failed to send request to bridge: {0}")]
    SendRequest(io::Error),
    #[error("failed to read response from bridge: {0}")]
    ReadResponse(io::Error),
    #[error("bridge at {endpoint} did not answer within {waited}s; is the host ticking?")]
    NoReply { endpoint: String, waited: u64 },
    #[error("bridge sent a malformed HTTP response: {0}")]
    MalformedResponse(String),
    #[error("failed to parse bridge envelope: {0}")]
    ParseEnvelope(serde_json::Error),
    #[error("failed to print envelope: {0}")]
    Emit(io::Error),
}

impl AppError {
    /// Whether the error means nothing listens on the endpoint, so the next
    /// candidate is worth trying.
    pub(crate) fn is_bridge_not_running(&self) -> bool {
        match self {
            Self::Connect { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::NotFound
                    | io::ErrorKind::AddrNotAvailable
            ),
            _ => false,
        }
    }
}

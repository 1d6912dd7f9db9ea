//! Errors raised while binding the acceptor or stopping it.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced while binding, starting or stopping the acceptor.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host name resolved to nothing usable.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Binding the TCP socket failed.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Address the bind was attempted on.
        addr: SocketAddr,
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// The bound socket could not be switched to non-blocking accepts.
    #[error("failed to configure listener: {source}")]
    Configure {
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// Unix endpoints were configured on a platform without them.
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix {
        /// Configured endpoint.
        endpoint: String,
    },
    /// Binding the Unix socket failed.
    #[cfg(unix)]
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        /// Socket path.
        path: String,
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// A live bridge already answers on the Unix socket.
    #[cfg(unix)]
    #[error("unix socket {path} is already in use")]
    UnixInUse {
        /// Socket path.
        path: String,
    },
    /// The socket path exists and is not a socket left by an earlier bridge.
    #[cfg(unix)]
    #[error("unix socket path {path} is occupied by another file")]
    UnixNotSocket {
        /// Socket path.
        path: String,
    },
    /// Probing or removing a leftover socket file failed.
    #[cfg(unix)]
    #[error("failed to reclaim unix socket {path}: {source}")]
    StaleSocket {
        /// Socket path.
        path: String,
        /// Filesystem or socket error.
        #[source]
        source: io::Error,
    },
    /// The candidate list was empty.
    #[error("no socket endpoints to bind")]
    NoCandidates,
    /// The accept thread could not be spawned.
    #[error("failed to spawn accept thread: {source}")]
    Spawn {
        /// Thread creation error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("accept thread panicked")]
    ThreadPanic,
}

impl ListenerError {
    /// Whether binding failed because another listener holds the address.
    /// The port search moves on to the next candidate only for this error.
    #[must_use]
    pub fn is_address_in_use(&self) -> bool {
        match self {
            Self::BindTcp { source, .. } => source.kind() == io::ErrorKind::AddrInUse,
            #[cfg(unix)]
            Self::UnixInUse { .. } => true,
            _ => false,
        }
    }
}

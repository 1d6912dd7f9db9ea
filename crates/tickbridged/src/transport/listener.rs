//! Binding the configured endpoint and running the accept thread.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use tickbridge_config::SocketEndpoint;

use super::in_flight::{InFlight, InFlightSlot};
use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

const IDLE_POLL: Duration = Duration::from_millis(25);
const ERROR_POLL: Duration = Duration::from_millis(150);

/// Endpoint bound and ready to start accepting.
#[derive(Debug)]
pub struct SocketListener {
    endpoint: SocketEndpoint,
    socket: BoundSocket,
}

#[derive(Debug)]
enum BoundSocket {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl BoundSocket {
    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(listener) => listener.set_nonblocking(true),
        }
    }

    /// Takes one pending connection, `None` when nothing is waiting.
    fn accept(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                io::Result::Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                io::Result::Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl SocketListener {
    /// Binds `endpoint`. A Unix socket file left by a bridge that is no
    /// longer running is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the address cannot be resolved or bound.
    pub fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let listener = bind_tcp(host, *port)?;
                let bound_port = listener.local_addr().map_or(*port, |addr| addr.port());
                Ok(Self {
                    endpoint: SocketEndpoint::tcp(host.clone(), bound_port),
                    socket: BoundSocket::Tcp(listener),
                })
            }
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => Ok(Self {
                endpoint: endpoint.clone(),
                socket: BoundSocket::Unix(bind_unix(path.as_std_path())?),
            }),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => Err(ListenerError::UnsupportedUnix {
                endpoint: endpoint.to_string(),
            }),
        }
    }

    /// Endpoint actually bound; a TCP port of zero is replaced by the port
    /// the operating system picked.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Local TCP address, when bound over TCP.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.socket {
            BoundSocket::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            BoundSocket::Unix(_) => None,
        }
    }

    /// Starts accepting on a background thread. Every accepted connection
    /// runs `handler` on its own thread and counts as in flight until the
    /// handler returns.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Configure`] when the socket cannot poll, or
    /// [`ListenerError::Spawn`] when the accept thread cannot start.
    pub fn start(self, handler: Arc<dyn ConnectionHandler>) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.socket.set_nonblocking() {
            remove_socket_file(&self.endpoint);
            return Err(ListenerError::Configure { source });
        }
        let acceptor = Acceptor {
            endpoint: self.endpoint.clone(),
            socket: self.socket,
            stopping: Arc::new(AtomicBool::new(false)),
            in_flight: InFlight::default(),
            handler,
        };
        let stopping = Arc::clone(&acceptor.stopping);
        let in_flight = acceptor.in_flight.clone();
        let thread = thread::Builder::new()
            .name(String::from("tickbridge-accept"))
            .spawn(move || acceptor.run())
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            endpoint: self.endpoint,
            stopping,
            in_flight,
            thread: Some(thread),
        })
    }
}

/// State owned by the accept thread.
struct Acceptor {
    endpoint: SocketEndpoint,
    socket: BoundSocket,
    stopping: Arc<AtomicBool>,
    in_flight: InFlight,
    handler: Arc<dyn ConnectionHandler>,
}

impl Acceptor {
    fn run(self) {
        info!(target: LISTENER_TARGET, endpoint = %self.endpoint, "accepting connections");
        let mut repeated = None::<io::ErrorKind>;
        while !self.stopping.load(Ordering::SeqCst) {
            match self.socket.accept() {
                Ok(Some(stream)) => {
                    repeated = None;
                    self.dispatch(stream);
                }
                Ok(None) => thread::sleep(IDLE_POLL),
                Err(error) => {
                    // One warning per run of identical failures.
                    if repeated != Some(error.kind()) {
                        warn!(target: LISTENER_TARGET, error = %error, "accept failed");
                    }
                    repeated = Some(error.kind());
                    thread::sleep(ERROR_POLL);
                }
            }
        }
        debug!(target: LISTENER_TARGET, endpoint = %self.endpoint, "accept loop stopped");
        remove_socket_file(&self.endpoint);
    }

    /// The slot is taken before spawning so a stop issued right after the
    /// accept still sees this connection.
    fn dispatch(&self, stream: ConnectionStream) {
        let slot = self.in_flight.enter();
        let handler = Arc::clone(&self.handler);
        let spawned = thread::Builder::new()
            .name(String::from("tickbridge-conn"))
            .spawn(move || serve(&*handler, stream, slot));
        if let Err(error) = spawned {
            warn!(target: LISTENER_TARGET, error = %error, "dropping connection: no thread");
        }
    }
}

fn serve(handler: &dyn ConnectionHandler, stream: ConnectionStream, _slot: InFlightSlot) {
    handler.handle(stream);
}

/// Handle to a running accept thread.
#[derive(Debug)]
pub struct ListenerHandle {
    endpoint: SocketEndpoint,
    stopping: Arc<AtomicBool>,
    in_flight: InFlight,
    thread: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Endpoint the listener is bound to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// Connections accepted whose handler has not returned yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Asks the accept loop to stop; it exits within one poll interval.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    /// Stops accepting, joins the accept thread, then waits up to `grace`
    /// for connection handlers still running. Returns how many were still
    /// running when the wait ended.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the accept thread panicked.
    pub fn stop(mut self, grace: Duration) -> Result<usize, ListenerError> {
        self.shutdown();
        if let Some(thread) = self.thread.take() {
            thread.join().map_err(|_| ListenerError::ThreadPanic)?;
        }
        Ok(self.in_flight.wait_idle(grace))
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let resolve_error = |source| ListenerError::Resolve {
        host: host.to_owned(),
        port,
        source,
    };
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(resolve_error)?
        .next()
        .ok_or_else(|| {
            resolve_error(io::Error::new(
                io::ErrorKind::NotFound,
                "host resolved to no addresses",
            ))
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}

#[cfg(unix)]
fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    let display = || path.display().to_string();
    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.file_type().is_socket() => {
            return Err(ListenerError::UnixNotSocket { path: display() });
        }
        Ok(_) => reclaim_stale_socket(path)?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ListenerError::StaleSocket {
                path: display(),
                source,
            });
        }
    }
    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: display(),
        source,
    })
}

/// Removes a socket file nobody answers on; refuses when a peer accepts.
#[cfg(unix)]
fn reclaim_stale_socket(path: &Path) -> Result<(), ListenerError> {
    let display = || path.display().to_string();
    match UnixStream::connect(path) {
        Ok(_) => Err(ListenerError::UnixInUse { path: display() }),
        Err(error)
            if matches!(
                error.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
            ) =>
        {
            fs::remove_file(path).map_err(|source| ListenerError::StaleSocket {
                path: display(),
                source,
            })
        }
        Err(source) => Err(ListenerError::StaleSocket {
            path: display(),
            source,
        }),
    }
}

#[cfg(unix)]
fn remove_socket_file(endpoint: &SocketEndpoint) {
    if let SocketEndpoint::Unix { path } = endpoint
        && let Err(error) = fs::remove_file(path.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(target: LISTENER_TARGET, error = %error, path = %path, "socket file left behind");
    }
}

#[cfg(not(unix))]
fn remove_socket_file(_endpoint: &SocketEndpoint) {}

//! Finding the bridge and talking to it over a single connection.
//!
//! [`discover`] walks the configured candidates in the order the bridge
//! tries them when binding, so a bridge that fell back to a later port is
//! still found.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tickbridge_config::SocketEndpoint;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use super::AppError;

pub(super) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// The bridge answers on the host's next tick; a host that stops ticking
/// must not hang the client forever.
pub(super) const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// An open connection to one bridge endpoint.
pub(super) struct Connection {
    endpoint: SocketEndpoint,
    stream: Stream,
}

enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    fn new(endpoint: &SocketEndpoint, stream: Stream) -> io::Result<Self> {
        match &stream {
            Stream::Tcp(tcp) => tcp.set_read_timeout(Some(REPLY_TIMEOUT))?,
            #[cfg(unix)]
            Stream::Unix(unix) => unix.set_read_timeout(Some(REPLY_TIMEOUT))?,
        }
        Ok(Self {
            endpoint: endpoint.clone(),
            stream,
        })
    }

    /// Names the endpoint when reading the reply hit [`REPLY_TIMEOUT`];
    /// other errors pass through.
    pub(super) fn explain_read_error(&self, error: AppError) -> AppError {
        match error {
            AppError::ReadResponse(source)
                if matches!(
                    source.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                AppError::NoReply {
                    endpoint: self.endpoint.to_string(),
                    waited: REPLY_TIMEOUT.as_secs(),
                }
            }
            other => other,
        }
    }

    fn io(&mut self) -> &mut dyn ReadWrite {
        match &mut self.stream {
            Stream::Tcp(stream) => stream,
            #[cfg(unix)]
            Stream::Unix(stream) => stream,
        }
    }
}

trait ReadWrite: Read + Write {}

impl<T: Read + Write> ReadWrite for T {}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.io().read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.io().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.io().flush()
    }
}

/// Connects to the first candidate with a listener. Only "nothing listening"
/// failures move on to the next candidate.
pub(super) fn discover(candidates: &[SocketEndpoint]) -> Result<Connection, AppError> {
    for candidate in candidates {
        match connect(candidate) {
            Ok(connection) => return Ok(connection),
            Err(error) if error.is_bridge_not_running() => {}
            Err(error) => return Err(error),
        }
    }
    let tried = candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(AppError::NoBridge { tried })
}

pub(super) fn connect(endpoint: &SocketEndpoint) -> Result<Connection, AppError> {
    let connect_error = |source| AppError::Connect {
        endpoint: endpoint.to_string(),
        source,
    };
    let stream = match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address = (host.as_str(), *port)
                .to_socket_addrs()
                .and_then(|mut addrs| {
                    addrs.next().ok_or_else(|| {
                        io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses")
                    })
                })
                .map_err(|source| AppError::Resolve {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)
                .map(Stream::Tcp)
                .map_err(connect_error)?
        }
        #[cfg(unix)]
        SocketEndpoint::Unix { path } => connect_unix(path.as_str()).map_err(connect_error)?,
        #[cfg(not(unix))]
        SocketEndpoint::Unix { path: _ } => {
            return Err(AppError::UnsupportedUnixTransport(endpoint.to_string()));
        }
    };
    Connection::new(endpoint, stream).map_err(connect_error)
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<Stream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.connect_timeout(&SockAddr::unix(path)?, CONNECTION_TIMEOUT)?;
    Ok(Stream::Unix(UnixStream::from(std::os::fd::OwnedFd::from(socket))))
}

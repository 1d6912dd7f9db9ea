//! Acceptor-side connection handler.
//!
//! Runs on the connection's own thread: decodes one request and queues it.
//! Pre-flight requests and requests that cannot be decoded are answered
//! here without reaching the coordinator, since neither needs host state.

use std::time::Duration;

use tracing::{debug, warn};

use crate::dispatch::BridgeError;
use crate::transport::{ConnectionHandler, ConnectionStream};
use crate::wire::{Method, ResponseWriter, ResultEnvelope, WireError, read_request};

use super::COORDINATOR_TARGET;
use super::queue::{PendingWork, QueueClosed, WorkQueue};

/// Limits applied while decoding a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeLimits {
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Socket read timeout; zero disables it.
    pub read_timeout: Duration,
}

/// [`ConnectionHandler`] that feeds a [`WorkQueue`].
#[derive(Debug, Clone)]
pub struct QueueingConnectionHandler {
    queue: WorkQueue,
    limits: IntakeLimits,
}

impl QueueingConnectionHandler {
    /// Builds a handler pushing onto `queue`.
    #[must_use]
    pub const fn new(queue: WorkQueue, limits: IntakeLimits) -> Self {
        Self { queue, limits }
    }
}

impl ConnectionHandler for QueueingConnectionHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        if let Err(error) = stream.set_read_timeout(self.limits.read_timeout) {
            warn!(
                target: COORDINATOR_TARGET,
                error = %error,
                "failed to apply read timeout"
            );
        }
        match read_request(&mut stream, self.limits.max_body_bytes) {
            Ok(None) => {
                debug!(target: COORDINATOR_TARGET, "connection closed without a request");
            }
            Ok(Some(request)) if request.method() == Method::Options => {
                if let Err(error) = ResponseWriter::new(&mut stream).write_preflight() {
                    warn!(
                        target: COORDINATOR_TARGET,
                        error = %error,
                        "failed to answer pre-flight request"
                    );
                }
            }
            Ok(Some(request)) => {
                debug!(
                    target: COORDINATOR_TARGET,
                    method = %request.method(),
                    path = request.path(),
                    "request queued"
                );
                if let Err(QueueClosed(work)) = self.queue.push(PendingWork::new(request, stream)) {
                    refuse_late(*work);
                }
            }
            Err(error) => reject(&mut stream, &error),
        }
    }
}

/// Answers a request decoded after the coordinator ran its final drain.
fn refuse_late(work: PendingWork) {
    let (request, mut sink, _) = work.into_parts();
    debug!(
        target: COORDINATOR_TARGET,
        method = %request.method(),
        path = request.path(),
        "request refused during shutdown"
    );
    let envelope = BridgeError::ShuttingDown.to_envelope();
    if let Err(error) = ResponseWriter::new(&mut sink).write_envelope(200, &envelope) {
        warn!(
            target: COORDINATOR_TARGET,
            error = %error,
            "failed to write shutdown refusal"
        );
    }
}

/// Answers a request that could not be decoded. I/O failures leave nobody
/// to answer and are only logged.
fn reject(stream: &mut ConnectionStream, error: &WireError) {
    let envelope: ResultEnvelope = match error {
        WireError::Io(source) => {
            warn!(
                target: COORDINATOR_TARGET,
                error = %source,
                "failed to read request"
            );
            return;
        }
        WireError::UnsupportedMethod { method, path } => {
            BridgeError::route_not_found(method, path.as_str()).to_envelope()
        }
        other => BridgeError::malformed(other.to_string()).to_envelope(),
    };
    debug!(
        target: COORDINATOR_TARGET,
        error = %error,
        "request rejected before queueing"
    );
    if let Err(write_error) = ResponseWriter::new(stream).write_envelope(200, &envelope) {
        warn!(
            target: COORDINATOR_TARGET,
            error = %write_error,
            "failed to write rejection"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{Shutdown, TcpListener, TcpStream};
    use std::thread;

    use rstest::{fixture, rstest};

    use super::*;

    struct Harness {
        queue: WorkQueue,
        handler: QueueingConnectionHandler,
    }

    #[fixture]
    fn harness() -> Harness {
        let queue = WorkQueue::new();
        let handler = QueueingConnectionHandler::new(
            queue.clone(),
            IntakeLimits {
                max_body_bytes: 32,
                read_timeout: Duration::from_secs(2),
            },
        );
        Harness { queue, handler }
    }

    /// Sends `raw` through the handler and returns whatever it answered
    /// inline.
    fn exchange(handler: &QueueingConnectionHandler, raw: &str) -> String {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let addr = listener.local_addr().expect("addr");
        let raw = raw.to_owned();
        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).expect("connect");
            stream.write_all(raw.as_bytes()).expect("write");
            stream.shutdown(Shutdown::Write).expect("half close");
            let mut response = String::new();
            stream.read_to_string(&mut response).expect("read");
            response
        });
        let (stream, _) = listener.accept().expect("accept");
        handler.handle(ConnectionStream::Tcp(stream));
        client.join().expect("client thread")
    }

    #[rstest]
    fn preflight_is_answered_inline(harness: Harness) {
        let response = exchange(
            &harness.handler,
            "OPTIONS /unity/scene/create HTTP/1.1\r\nHost: x\r\n\r\n",
        );
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("Access-Control-Allow-Origin: *"));
        assert!(harness.queue.is_empty());
    }

    #[rstest]
    fn oversized_bodies_are_rejected_inline(harness: Harness) {
        let body = "x".repeat(64);
        let raw = format!(
            "POST /unity/command HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let response = exchange(&harness.handler, &raw);
        assert!(response.contains("\"error_kind\":\"malformed_request\""), "{response}");
        assert!(harness.queue.is_empty());
    }

    #[rstest]
    fn unsupported_methods_name_the_route(harness: Harness) {
        let response = exchange(&harness.handler, "DELETE /unity/scene HTTP/1.1\r\n\r\n");
        assert!(response.contains("\"error_kind\":\"route_not_found\""), "{response}");
        assert!(response.contains("DELETE"));
    }

    #[rstest]
    fn requests_after_close_are_refused_inline(harness: Harness) {
        harness.queue.close();
        let response = exchange(&harness.handler, "GET /unity/health HTTP/1.1\r\n\r\n");
        assert!(response.contains("\"error_kind\":\"shutting_down\""), "{response}");
        assert!(harness.queue.is_empty());
    }

    #[rstest]
    fn decoded_requests_are_queued(harness: Harness) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
        let addr = listener.local_addr().expect("addr");
        let mut client = TcpStream::connect(addr).expect("connect");
        client
            .write_all(b"GET /unity/status?limit=2 HTTP/1.1\r\n\r\n")
            .expect("write");
        let (stream, _) = listener.accept().expect("accept");
        harness.handler.handle(ConnectionStream::Tcp(stream));

        let batch = harness.queue.drain_all();
        let queued = batch.front().expect("one queued item");
        assert_eq!(queued.request().path(), "/unity/status");
        assert_eq!(
            queued.request().query().get("limit").map(String::as_str),
            Some("2")
        );
    }
}

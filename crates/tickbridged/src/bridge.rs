//! Embedding entry point: a bound acceptor plus the coordinator it feeds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use tickbridge_config::{Config, SocketEndpoint};

use crate::coordinator::{Coordinator, IntakeLimits, QueueingConnectionHandler, TickReport};
use crate::health::HealthReporter;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

const BRIDGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bridge");

/// A running bridge.
///
/// The acceptor runs on background threads; the embedding application owns
/// the coordinator through this value and calls [`Bridge::tick`] from the
/// thread that owns the host graph.
#[derive(Debug)]
pub struct Bridge {
    coordinator: Coordinator,
    listener: ListenerHandle,
    drain_grace: Duration,
}

impl Bridge {
    /// Binds the configured endpoint, searching successive ports when it is
    /// in use, and starts accepting.
    ///
    /// # Errors
    ///
    /// Returns the bind error of the last candidate tried, or the first
    /// error that is not an address conflict.
    pub fn start(config: &Config, reporter: Arc<dyn HealthReporter>) -> Result<Self, ListenerError> {
        let coordinator = Coordinator::from_config(config, Arc::clone(&reporter));
        Self::start_with(config, coordinator, reporter.as_ref())
    }

    /// Like [`Bridge::start`] but with a coordinator the caller prepared,
    /// for example with extra routes registered.
    ///
    /// # Errors
    ///
    /// See [`Bridge::start`].
    pub fn start_with(
        config: &Config,
        coordinator: Coordinator,
        reporter: &dyn HealthReporter,
    ) -> Result<Self, ListenerError> {
        let listener = bind_first_available(&config.socket_candidates())?;
        let endpoint = listener.endpoint().clone();
        let handler = Arc::new(QueueingConnectionHandler::new(
            coordinator.queue(),
            IntakeLimits {
                max_body_bytes: config.max_body_bytes(),
                read_timeout: config.read_timeout(),
            },
        ));
        let listener = listener.start(handler)?;
        if &endpoint != config.bridge_socket() && config.bridge_socket().tcp_port() != Some(0) {
            info!(
                target: BRIDGE_TARGET,
                configured = %config.bridge_socket(),
                bound = %endpoint,
                "configured endpoint unavailable; using fallback"
            );
        }
        reporter.listener_bound(&endpoint);
        Ok(Self {
            coordinator,
            listener,
            drain_grace: config.read_timeout(),
        })
    }

    /// Endpoint the acceptor is bound to.
    #[must_use]
    pub const fn endpoint(&self) -> &SocketEndpoint {
        self.listener.endpoint()
    }

    /// Executes everything queued since the previous tick.
    pub fn tick(&mut self) -> TickReport {
        self.coordinator.tick()
    }

    /// The coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// The coordinator, for host-side access between ticks.
    pub fn coordinator_mut(&mut self) -> &mut Coordinator {
        &mut self.coordinator
    }

    /// Stops accepting and waits, up to the configured read timeout, for
    /// connections still sending their request. The queue is then closed
    /// and drained once more. A connection that finishes its request after
    /// the close is answered inline with a `shutting_down` error, so no
    /// accepted connection goes unanswered.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the accept thread panicked.
    pub fn shutdown(self) -> Result<Coordinator, ListenerError> {
        let Self {
            mut coordinator,
            listener,
            drain_grace,
        } = self;
        let lingering = listener.stop(drain_grace)?;
        if lingering > 0 {
            warn!(
                target: BRIDGE_TARGET,
                lingering,
                "connections still reading at shutdown will be refused"
            );
        }
        coordinator.queue().close();
        let report = coordinator.tick();
        debug!(
            target: BRIDGE_TARGET,
            drained = report.executed,
            "final drain complete"
        );
        Ok(coordinator)
    }
}

/// Binds the first candidate that is not already in use.
fn bind_first_available(candidates: &[SocketEndpoint]) -> Result<SocketListener, ListenerError> {
    let mut last_error = ListenerError::NoCandidates;
    for candidate in candidates {
        match SocketListener::bind(candidate) {
            Ok(listener) => return Ok(listener),
            Err(error) if error.is_address_in_use() => {
                debug!(
                    target: BRIDGE_TARGET,
                    endpoint = %candidate,
                    "endpoint in use; trying next"
                );
                last_error = error;
            }
            Err(error) => return Err(error),
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::health::StructuredHealthReporter;

    fn connect_to(bridge: &Bridge) -> TcpStream {
        let port = bridge.endpoint().tcp_port().expect("tcp endpoint");
        TcpStream::connect(("127.0.0.1", port)).expect("connect")
    }

    fn wait_for_in_flight(bridge: &Bridge, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while bridge.listener.in_flight() < expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(bridge.listener.in_flight(), expected);
    }

    fn config_on(port: u16, span: u16) -> Config {
        Config {
            bridge_socket: SocketEndpoint::tcp("127.0.0.1", port),
            port_search_span: span,
            ..Config::default()
        }
    }

    /// Sends one request and ticks until the response arrives.
    fn round_trip(bridge: &mut Bridge, raw: &'static str) -> String {
        let port = bridge.endpoint().tcp_port().expect("tcp endpoint");
        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
            stream.write_all(raw.as_bytes()).expect("write");
            let mut response = String::new();
            stream.read_to_string(&mut response).expect("read");
            response
        });
        let deadline = Instant::now() + Duration::from_secs(5);
        while !client.is_finished() && Instant::now() < deadline {
            bridge.tick();
            thread::sleep(Duration::from_millis(5));
        }
        client.join().expect("client thread")
    }

    #[test]
    fn port_search_skips_an_occupied_port() {
        let reserved = TcpListener::bind(("127.0.0.1", 0)).expect("reserve");
        let port = reserved.local_addr().expect("addr").port();
        let candidates = SocketEndpoint::tcp("127.0.0.1", port).port_candidates(3);
        let listener = bind_first_available(&candidates).expect("fallback bind");
        assert_ne!(listener.endpoint().tcp_port(), Some(port));
    }

    #[test]
    fn port_search_gives_up_after_the_span() {
        let reserved = TcpListener::bind(("127.0.0.1", 0)).expect("reserve");
        let port = reserved.local_addr().expect("addr").port();
        let error = Bridge::start(&config_on(port, 0), Arc::new(StructuredHealthReporter::new()))
            .expect_err("no free candidate");
        assert!(error.is_address_in_use());
    }

    #[test]
    fn requests_are_answered_through_ticks() {
        let mut bridge = Bridge::start(&config_on(0, 0), Arc::new(StructuredHealthReporter::new()))
            .expect("start bridge");
        let response = round_trip(
            &mut bridge,
            "POST /unity/command HTTP/1.1\r\nContent-Length: 14\r\n\r\ncreate Beacon\n",
        );
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(bridge.coordinator().host().resolve("Beacon", false).is_ok());
        let coordinator = bridge.shutdown().expect("shutdown");
        assert_eq!(coordinator.stats().processed(), 1);
    }

    #[test]
    fn shutdown_answers_requests_still_being_sent() {
        let bridge = Bridge::start(&config_on(0, 0), Arc::new(StructuredHealthReporter::new()))
            .expect("start bridge");
        let mut stream = connect_to(&bridge);
        wait_for_in_flight(&bridge, 1);
        let client = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            let body = "create Latecomer\n";
            let request = format!(
                "POST /unity/command HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(request.as_bytes()).expect("write");
            let mut response = String::new();
            stream.read_to_string(&mut response).expect("read");
            response
        });

        let coordinator = bridge.shutdown().expect("shutdown");
        let response = client.join().expect("client thread");
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.contains("\"status\":\"success\""), "{response}");
        assert!(coordinator.host().resolve("Latecomer", false).is_ok());
        assert!(coordinator.queue().is_closed());
    }

    #[test]
    fn requests_finishing_after_the_grace_are_refused() {
        let config = Config {
            read_timeout_ms: 2_000,
            ..config_on(0, 0)
        };
        let mut bridge = Bridge::start(&config, Arc::new(StructuredHealthReporter::new()))
            .expect("start bridge");
        bridge.drain_grace = Duration::from_millis(20);
        let mut stream = connect_to(&bridge);
        wait_for_in_flight(&bridge, 1);

        let coordinator = bridge.shutdown().expect("shutdown");
        stream
            .write_all(b"GET /unity/health HTTP/1.1\r\n\r\n")
            .expect("write");
        let mut response = String::new();
        stream.read_to_string(&mut response).expect("read");
        assert!(response.contains("\"error_kind\":\"shutting_down\""), "{response}");
        assert!(coordinator.queue().is_empty());
    }
}

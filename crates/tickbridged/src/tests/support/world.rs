//! BDD test world: loader, reporter, bootstrap outcome and the running
//! bridge shared by step functions.

use std::cell::RefCell;
use std::net::TcpListener;
use std::sync::Arc;

use tickbridge_config::{Config, SocketEndpoint};

use crate::bootstrap::{BootstrapError, Bootstrapped, ConfigLoader, bootstrap_with};
use crate::bridge::Bridge;
use crate::health::HealthReporter;

use super::client::{BridgeClient, HttpReply};
use super::config_loader::{FailingConfigLoader, InvalidConfigLoader, TestConfigLoader};
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    bootstrapped: Option<Bootstrapped>,
    bootstrap_error: Option<BootstrapError>,
    bridge: Option<Bridge>,
    start_error: Option<String>,
    reserved: Option<TcpListener>,
    last_reply: Option<HttpReply>,
}

impl TestWorld {
    /// Builds a world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: Box::new(TestConfigLoader::new()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            bootstrapped: None,
            bootstrap_error: None,
            bridge: None,
            start_error: None,
            reserved: None,
            last_reply: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
        self.reset_results();
    }

    /// Installs a loader whose configuration fails validation.
    pub fn use_invalid_loader(&mut self) {
        self.loader = Box::new(InvalidConfigLoader);
        self.reset_results();
    }

    /// Installs a loader that succeeds.
    pub fn use_successful_loader(&mut self) {
        self.loader = Box::new(TestConfigLoader::new());
        self.reset_results();
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.bootstrapped.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.as_ref()) {
            Ok(bootstrapped) => self.bootstrapped = Some(bootstrapped),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Returns the bootstrap error, if any.
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the bootstrapped configuration, if any.
    pub fn bootstrapped_config(&self) -> Option<&Config> {
        self.bootstrapped.as_ref().map(Bootstrapped::config)
    }

    /// Starts a bridge on the bootstrapped configuration.
    pub fn start_bootstrapped_bridge(&mut self) {
        self.bootstrap();
        let config = self
            .bootstrapped_config()
            .cloned()
            .expect("bootstrap should have succeeded");
        self.start_bridge(&config);
    }

    /// Starts a bridge on an ephemeral loopback port.
    pub fn start_ephemeral_bridge(&mut self) {
        self.start_tcp_bridge(0, 0);
    }

    /// Starts a bridge on `port`, searching `span` further ports.
    pub fn start_tcp_bridge(&mut self, port: u16, span: u16) {
        let config = Config {
            bridge_socket: SocketEndpoint::tcp("127.0.0.1", port),
            port_search_span: span,
            ..Config::default()
        };
        self.start_bridge(&config);
    }

    fn start_bridge(&mut self, config: &Config) {
        let reporter: Arc<dyn HealthReporter> = self.reporter.clone();
        match Bridge::start(config, reporter) {
            Ok(bridge) => self.bridge = Some(bridge),
            Err(error) => self.start_error = Some(error.to_string()),
        }
    }

    /// Occupies a loopback port and returns it.
    pub fn reserve_port(&mut self) -> u16 {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind reserved port");
        let port = listener.local_addr().expect("local addr").port();
        self.reserved = Some(listener);
        port
    }

    /// Port currently held by [`TestWorld::reserve_port`].
    pub fn reserved_port(&self) -> Option<u16> {
        self.reserved
            .as_ref()
            .and_then(|listener| listener.local_addr().ok())
            .map(|addr| addr.port())
    }

    /// The running bridge.
    pub fn bridge(&self) -> &Bridge {
        self.bridge.as_ref().expect("bridge should be running")
    }

    /// The error reported when the bridge failed to start.
    pub fn start_error(&self) -> Option<&str> {
        self.start_error.as_deref()
    }

    /// Sends `raw` to the running bridge and keeps the reply.
    pub fn send(&mut self, raw: String) {
        let bridge = self.bridge.as_mut().expect("bridge should be running");
        self.last_reply = Some(BridgeClient::round_trip(bridge, raw));
    }

    /// The most recent reply.
    pub fn reply(&self) -> &HttpReply {
        self.last_reply.as_ref().expect("no reply recorded")
    }

    fn reset_results(&mut self) {
        self.bootstrapped = None;
        self.bootstrap_error = None;
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestWorld {
    fn drop(&mut self) {
        if let Some(bridge) = self.bridge.take() {
            drop(bridge.shutdown());
        }
        self.reserved = None;
    }
}

/// Default test world fixture.
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}

//! Shared fixtures for CLI tests.

mod fake_bridge;

use std::ffi::OsString;

use tickbridge_config::{Config, SocketEndpoint};

use crate::{AppError, ConfigLoader};

pub(in crate::tests) use fake_bridge::FakeBridge;

/// Loader returning a fixed configuration and recording nothing.
pub(in crate::tests) struct StaticLoader(pub Config);

impl StaticLoader {
    /// Points the client at `port` on loopback with no port search.
    pub fn tcp(port: u16) -> Self {
        Self(Config {
            bridge_socket: SocketEndpoint::tcp("127.0.0.1", port),
            port_search_span: 0,
            ..Config::default()
        })
    }
}

impl ConfigLoader for StaticLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.0.clone())
    }
}

/// Builds an argument vector from string slices.
pub(in crate::tests) fn args(values: &[&str]) -> Vec<OsString> {
    values.iter().map(OsString::from).collect()
}

/// A loopback port that had a listener a moment ago and now has none.
pub(in crate::tests) fn vacant_port() -> u16 {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind scratch listener");
    listener.local_addr().expect("scratch addr").port()
}

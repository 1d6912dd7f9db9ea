//! Minimal controller-side client used to drive a running bridge.

use std::io::{Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;
use tickbridge_config::SocketEndpoint;

use crate::bridge::Bridge;

/// A decoded HTTP reply.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status_code: u16,
    pub head: String,
    pub body: Value,
}

impl HttpReply {
    fn parse(raw: &str) -> Self {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
        let status_code = head
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).expect("response body is JSON")
        };
        Self {
            status_code,
            head: head.to_owned(),
            body,
        }
    }

    /// The envelope's `status` field.
    pub fn status(&self) -> &str {
        self.body["status"].as_str().unwrap_or_default()
    }

    /// The envelope's `data.error_kind` field, when present.
    pub fn error_kind(&self) -> Option<&str> {
        self.body["data"]["error_kind"].as_str()
    }
}

/// Sends raw requests to a bridge from a background thread.
pub struct BridgeClient;

impl BridgeClient {
    /// Sends `raw` and reads the reply until the bridge closes the stream.
    pub fn spawn(endpoint: &SocketEndpoint, raw: String) -> JoinHandle<HttpReply> {
        let endpoint = endpoint.clone();
        thread::spawn(move || {
            let mut response = String::new();
            match endpoint {
                SocketEndpoint::Tcp { host, port } => {
                    let mut stream = TcpStream::connect((host.as_str(), port)).expect("connect");
                    stream.write_all(raw.as_bytes()).expect("write request");
                    stream.read_to_string(&mut response).expect("read reply");
                }
                #[cfg(unix)]
                SocketEndpoint::Unix { path } => {
                    let mut stream = UnixStream::connect(path.as_std_path()).expect("connect");
                    stream.write_all(raw.as_bytes()).expect("write request");
                    stream.read_to_string(&mut response).expect("read reply");
                }
                #[cfg(not(unix))]
                SocketEndpoint::Unix { .. } => panic!("unix sockets are unsupported"),
            }
            HttpReply::parse(&response)
        })
    }

    /// Sends `raw` and ticks `bridge` until the reply arrives, as the host
    /// loop would.
    pub fn round_trip(bridge: &mut Bridge, raw: String) -> HttpReply {
        let client = Self::spawn(bridge.endpoint(), raw);
        let deadline = Instant::now() + Duration::from_secs(5);
        while !client.is_finished() && Instant::now() < deadline {
            bridge.tick();
            thread::sleep(Duration::from_millis(5));
        }
        client.join().expect("client thread panicked")
    }

    /// Formats a `POST` with the given body.
    pub fn post(path: &str, body: &str) -> String {
        format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
    }

    /// Formats a body-less `GET`.
    pub fn get(path: &str) -> String {
        format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n")
    }
}

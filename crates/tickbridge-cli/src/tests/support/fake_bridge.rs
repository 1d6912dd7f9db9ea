//! Fake bridge for CLI tests.
//!
//! Accepts one connection, records the raw request and answers with a canned
//! envelope, the way the real bridge answers one request per connection.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};

pub(in crate::tests) struct FakeBridge {
    port: u16,
    handle: Option<thread::JoinHandle<Result<String>>>,
}

impl FakeBridge {
    /// Spawns a fake bridge answering with `envelope`.
    pub fn spawn(envelope: Value) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake bridge")?;
        let port = listener.local_addr().context("local addr")?.port();
        let handle = thread::spawn(move || Self::serve_one(&listener, &envelope));
        Ok(Self {
            port,
            handle: Some(handle),
        })
    }

    /// Spawns a fake bridge answering with an envelope of the given status.
    pub fn answering(status: &str) -> Result<Self> {
        Self::spawn(json!({
            "status": status,
            "message": format!("{status} reply"),
            "data": {},
            "timestamp": "2026-01-01T00:00:00Z",
        }))
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits for the connection to finish and returns the raw request.
    pub fn take_request(&mut self) -> Result<String> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("request already taken"))?;
        handle
            .join()
            .map_err(|_| anyhow!("fake bridge thread panicked"))?
    }

    fn serve_one(listener: &TcpListener, envelope: &Value) -> Result<String> {
        let (stream, _) = listener.accept().context("accept client")?;
        let mut reader = BufReader::new(stream.try_clone().context("clone stream")?);
        let mut request = String::new();
        let mut content_length = 0_usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).context("read head")? == 0 {
                break;
            }
            if let Some(value) = line
                .to_ascii_lowercase()
                .strip_prefix("content-length:")
                .map(str::trim)
            {
                content_length = value.parse().context("content length")?;
            }
            request.push_str(&line);
            if line == "\r\n" {
                break;
            }
        }
        let mut body = vec![0_u8; content_length];
        reader.read_exact(&mut body).context("read body")?;
        request.push_str(&String::from_utf8_lossy(&body));

        let payload = serde_json::to_vec(envelope).context("encode envelope")?;
        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            payload.len()
        )
        .context("write head")?;
        stream.write_all(&payload).context("write body")?;
        Ok(request)
    }
}

//! HTTP requests sent to the bridge and the decoding of its replies.

use std::io::{Read, Write};

use serde_json::Value;

use crate::AppError;
use crate::cli::CliCommand;

/// Route prefix shared by every bridge endpoint.
pub(crate) const BASE_PATH: &str = "/unity";

const MAX_HEADERS: usize = 32;

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
}

impl Method {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// One request to the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BridgeRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) body: String,
}

impl BridgeRequest {
    fn get(route: &str) -> Self {
        Self {
            method: Method::Get,
            path: route_path(route),
            body: String::new(),
        }
    }

    fn post(route: &str, body: String) -> Self {
        Self {
            method: Method::Post,
            path: route_path(route),
            body,
        }
    }

    /// Builds the request for `command`, reading a `-` body from `stdin`.
    pub(crate) fn from_command<R: Read>(command: CliCommand, stdin: &mut R) -> Result<Self, AppError> {
        let request = match command {
            CliCommand::Command { line } => Self::post("command", join_line(&line)),
            CliCommand::Health => Self::get("health"),
            CliCommand::Status => Self::get("status"),
            CliCommand::Log { reset: false } => Self::get("log"),
            CliCommand::Log { reset: true } => Self::post("log/reset", String::new()),
            CliCommand::Get { path } => Self::get(&path),
            CliCommand::Post { path, body } => {
                let body = match body.as_deref() {
                    Some("-") => {
                        let mut text = String::new();
                        stdin.read_to_string(&mut text).map_err(AppError::ReadBody)?;
                        text
                    }
                    Some(text) => text.to_owned(),
                    None => String::new(),
                };
                Self::post(&path, body)
            }
        };
        Ok(request)
    }

    /// Writes the request as one HTTP/1.1 message.
    pub(crate) fn write_http<W: Write>(&self, writer: &mut W) -> Result<(), AppError> {
        let head = format!(
            "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.method.as_str(),
            self.path,
            self.body.len()
        );
        writer
            .write_all(head.as_bytes())
            .and_then(|()| writer.write_all(self.body.as_bytes()))
            .and_then(|()| writer.flush())
            .map_err(AppError::SendRequest)
    }
}

fn route_path(route: &str) -> String {
    if route.starts_with('/') {
        route.to_owned()
    } else {
        format!("{BASE_PATH}/{route}")
    }
}

/// Rebuilds a command line from shell words, quoting the ones the bridge's
/// tokenizer would otherwise split.
fn join_line(words: &[String]) -> String {
    if let [single] = words {
        return single.clone();
    }
    words
        .iter()
        .map(|word| {
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                format!("\"{word}\"")
            } else {
                word.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A decoded reply.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BridgeReply {
    pub(crate) status_code: u16,
    pub(crate) envelope: Value,
}

impl BridgeReply {
    /// Reads the whole reply; the bridge closes the connection after it.
    pub(crate) fn read_from<R: Read>(reader: &mut R) -> Result<Self, AppError> {
        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(AppError::ReadResponse)?;
        Self::parse(&raw)
    }

    fn parse(raw: &[u8]) -> Result<Self, AppError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut response = httparse::Response::new(&mut headers);
        let head_len = match response.parse(raw) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => {
                return Err(AppError::MalformedResponse(
                    "connection closed mid-head".to_owned(),
                ));
            }
            Err(error) => return Err(AppError::MalformedResponse(error.to_string())),
        };
        let status_code = response.code.unwrap_or_default();
        let body = raw.get(head_len..).unwrap_or_default();
        let envelope = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(body).map_err(AppError::ParseEnvelope)?
        };
        Ok(Self {
            status_code,
            envelope,
        })
    }

    /// The envelope's `status` field.
    pub(crate) fn status(&self) -> Option<&str> {
        self.envelope.get("status").and_then(Value::as_str)
    }
}

//! Error types for HTTP envelope decoding and encoding.

use std::io;

use thiserror::Error;

/// Errors surfaced while reading or writing the HTTP wire envelope.
#[derive(Debug, Error)]
pub enum WireError {
    /// The request head grew past the configured limit before completing.
    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    /// The request head could not be parsed as HTTP/1.x.
    #[error("malformed HTTP request: {message}")]
    Malformed { message: String },

    /// The declared body length exceeds the configured limit.
    #[error("request body of {size} bytes exceeds {limit} byte limit")]
    BodyTooLarge { size: usize, limit: usize },

    /// The client closed the connection before sending the declared body.
    #[error("connection closed after {received} of {expected} body bytes")]
    TruncatedBody { received: usize, expected: usize },

    /// The HTTP method is not one the bridge serves.
    #[error("unsupported method {method} for {path}")]
    UnsupportedMethod { method: String, path: String },

    /// Socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl WireError {
    /// Creates a malformed request error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

//! HTTP/1.1 response encoding for result envelopes.

use std::io::Write;

use super::envelope::ResultEnvelope;
use super::errors::WireError;

/// Cross-origin headers attached to every response.
const CORS_HEADERS: &str = "Access-Control-Allow-Origin: *\r\n\
Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
Access-Control-Allow-Headers: Content-Type\r\n";

/// Writes HTTP responses to a connection.
pub struct ResponseWriter<W: Write> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `envelope` as a JSON body with the given status code.
    pub fn write_envelope(
        &mut self,
        status_code: u16,
        envelope: &ResultEnvelope,
    ) -> Result<(), WireError> {
        let body = envelope.to_json();
        self.write_response(status_code, Some("application/json"), &body)
    }

    /// Answers a CORS pre-flight request with an empty 200.
    pub fn write_preflight(&mut self) -> Result<(), WireError> {
        self.write_response(200, None, &[])
    }

    fn write_response(
        &mut self,
        status_code: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<(), WireError> {
        let mut head = format!("HTTP/1.1 {status_code} {}\r\n", reason_phrase(status_code));
        if let Some(content_type) = content_type {
            head.push_str("Content-Type: ");
            head.push_str(content_type);
            head.push_str("\r\n");
        }
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        head.push_str(CORS_HEADERS);
        head.push_str("Connection: close\r\n\r\n");

        self.writer.write_all(head.as_bytes())?;
        self.writer.write_all(body)?;
        self.writer.flush()?;
        Ok(())
    }
}

const fn reason_phrase(status_code: u16) -> &'static str {
    match status_code {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

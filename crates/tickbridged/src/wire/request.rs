//! HTTP/1.1 request decoding.
//!
//! One request is read per connection. The head is parsed with `httparse`
//! and the body is read according to `Content-Length`.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use strum::{Display, EnumString};

use super::errors::WireError;

/// Upper bound on the size of the request line plus headers.
pub(crate) const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Upper bound on the number of request headers.
const MAX_HEADERS: usize = 64;

/// Percent-decoded query parameters; the last occurrence of a key wins.
pub type QueryMap = BTreeMap<String, String>;

/// HTTP methods served by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// Read operations.
    Get,
    /// Mutating operations and the free-text command route.
    Post,
    /// Cross-origin pre-flight, answered without touching the host.
    Options,
}

/// Decoded request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query: QueryMap,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Builds a request from a method, a request target (`/path?query`) and
    /// a body.
    #[must_use]
    pub fn new(method: Method, target: &str, body: impl Into<Vec<u8>>) -> Self {
        let (path, query) = split_target(target);
        Self {
            method,
            path: normalise_path(path),
            query: parse_query(query),
            body: body.into(),
        }
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request path without the query string or a trailing slash.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query parameters.
    #[must_use]
    pub const fn query(&self) -> &QueryMap {
        &self.query
    }

    /// Raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

struct RequestHead {
    method: String,
    target: String,
    content_length: usize,
    head_len: usize,
}

/// Reads one request from `reader`.
///
/// Returns `Ok(None)` when the peer closes the connection without sending
/// anything.
pub fn read_request<R: Read>(
    reader: &mut R,
    max_body_bytes: usize,
) -> Result<Option<HttpRequest>, WireError> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0_u8; 4096];
    loop {
        let read = read_with_retry(reader, &mut chunk)?;
        if read == 0 {
            if buffer.is_empty() {
                return Ok(None);
            }
            return Err(WireError::malformed(
                "connection closed before the request head was complete",
            ));
        }
        buffer.extend_from_slice(&chunk[..read]);

        if let Some(head) = parse_head(&buffer)? {
            return finish_request(reader, head, buffer, max_body_bytes).map(Some);
        }
        if buffer.len() > MAX_HEAD_BYTES {
            return Err(WireError::HeadTooLarge {
                limit: MAX_HEAD_BYTES,
            });
        }
    }
}

fn parse_head(buffer: &[u8]) -> Result<Option<RequestHead>, WireError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut request = httparse::Request::new(&mut headers);
    let head_len = match request.parse(buffer) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(error) => return Err(WireError::malformed(error.to_string())),
    };
    if head_len > MAX_HEAD_BYTES {
        return Err(WireError::HeadTooLarge {
            limit: MAX_HEAD_BYTES,
        });
    }

    let method = request
        .method
        .ok_or_else(|| WireError::malformed("missing method"))?
        .to_owned();
    let target = request
        .path
        .ok_or_else(|| WireError::malformed("missing request target"))?
        .to_owned();

    let mut content_length = 0;
    for header in request.headers.iter() {
        if header.name.eq_ignore_ascii_case("content-length") {
            let text = std::str::from_utf8(header.value)
                .map_err(|_| WireError::malformed("non UTF-8 Content-Length"))?;
            content_length = text
                .trim()
                .parse()
                .map_err(|_| WireError::malformed(format!("invalid Content-Length '{text}'")))?;
        } else if header.name.eq_ignore_ascii_case("transfer-encoding") {
            return Err(WireError::malformed("chunked request bodies are not supported"));
        }
    }

    Ok(Some(RequestHead {
        method,
        target,
        content_length,
        head_len,
    }))
}

fn finish_request<R: Read>(
    reader: &mut R,
    head: RequestHead,
    mut buffer: Vec<u8>,
    max_body_bytes: usize,
) -> Result<HttpRequest, WireError> {
    let Ok(method) = Method::from_str(&head.method) else {
        let (path, _) = split_target(&head.target);
        return Err(WireError::UnsupportedMethod {
            method: head.method,
            path: normalise_path(path),
        });
    };
    if head.content_length > max_body_bytes {
        return Err(WireError::BodyTooLarge {
            size: head.content_length,
            limit: max_body_bytes,
        });
    }

    let mut body = buffer.split_off(head.head_len);
    body.truncate(head.content_length);
    let mut chunk = [0_u8; 4096];
    while body.len() < head.content_length {
        let wanted = (head.content_length - body.len()).min(chunk.len());
        let read = read_with_retry(reader, &mut chunk[..wanted])?;
        if read == 0 {
            return Err(WireError::TruncatedBody {
                received: body.len(),
                expected: head.content_length,
            });
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Ok(HttpRequest::new(method, &head.target, body))
}

fn read_with_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

fn split_target(target: &str) -> (&str, &str) {
    target.split_once('?').unwrap_or((target, ""))
}

fn normalise_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Decodes `a=1&b=two+words` into a map, treating `+` as a space.
#[must_use]
pub fn parse_query(query: &str) -> QueryMap {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            (!key.is_empty()).then(|| (key, decode_component(value)))
        })
        .collect()
}

/// Percent-decodes one URL component; `+` becomes a space.
#[must_use]
pub fn decode_component(text: &str) -> String {
    let spaced = text.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    fn read(raw: &str) -> Result<Option<HttpRequest>, WireError> {
        read_request(&mut Cursor::new(raw.as_bytes().to_vec()), 1024)
    }

    #[test]
    fn reads_post_with_body() {
        let request = read(
            "POST /unity/scene/find?limit=5 HTTP/1.1\r\nHost: x\r\nContent-Length: 13\r\n\r\n{\"filter\":{}}",
        )
        .expect("read")
        .expect("request");
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.path(), "/unity/scene/find");
        assert_eq!(request.query().get("limit").map(String::as_str), Some("5"));
        assert_eq!(request.body(), b"{\"filter\":{}}");
    }

    #[test]
    fn empty_connection_yields_nothing() {
        assert!(read("").expect("read").is_none());
    }

    #[test]
    fn rejects_oversized_body() {
        let error = read("POST /x HTTP/1.1\r\nContent-Length: 4096\r\n\r\n").expect_err("too big");
        assert!(matches!(error, WireError::BodyTooLarge { size: 4096, .. }));
    }

    #[test]
    fn rejects_truncated_body() {
        let error = read("POST /x HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").expect_err("short");
        assert!(matches!(
            error,
            WireError::TruncatedBody {
                received: 3,
                expected: 10
            }
        ));
    }

    #[test]
    fn reports_unsupported_methods_with_path() {
        let error = read("DELETE /unity/scene/ HTTP/1.1\r\n\r\n").expect_err("delete");
        assert!(matches!(
            error,
            WireError::UnsupportedMethod { ref method, ref path }
                if method == "DELETE" && path == "/unity/scene"
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let error = read("\x01\x02 nonsense\r\n\r\n").expect_err("garbage");
        assert!(matches!(error, WireError::Malformed { .. }));
    }

    #[rstest]
    #[case::plus("name=Main+Camera", "name", "Main Camera")]
    #[case::percent("name=Cube%20%231", "name", "Cube #1")]
    #[case::last_wins("limit=1&limit=9", "limit", "9")]
    #[case::flag("verbose", "verbose", "")]
    fn decodes_query_values(#[case] query: &str, #[case] key: &str, #[case] expected: &str) {
        assert_eq!(
            parse_query(query).get(key).map(String::as_str),
            Some(expected)
        );
    }
}

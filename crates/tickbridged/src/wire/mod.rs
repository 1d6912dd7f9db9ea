//! HTTP wire envelope: request decoding, response encoding and the uniform
//! result envelope.

mod envelope;
mod errors;
mod request;
mod response;

pub use self::envelope::{ResultEnvelope, Status};
pub(crate) use self::envelope::serialize_timestamp;
pub use self::errors::WireError;
pub use self::request::{HttpRequest, Method, QueryMap, decode_component, parse_query, read_request};
pub use self::response::ResponseWriter;

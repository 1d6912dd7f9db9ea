//! Uniform result envelope returned for every bridge request.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use strum::Display;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Overall outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    /// Every target succeeded.
    Success,
    /// Nothing succeeded.
    Error,
    /// Some targets succeeded and some failed.
    Partial,
}

/// Result envelope `{status, message, data, timestamp}`.
///
/// The constructors uphold the envelope invariants: `error` always carries at
/// least one entry in `data.errors`, `partial` carries non-empty
/// `data.affected_objects` and `data.errors`, and `success` never carries
/// `data.errors`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    status: Status,
    message: String,
    data: Map<String, Value>,
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: OffsetDateTime,
}

impl ResultEnvelope {
    /// Builds a success envelope; any `errors` key in `data` is dropped.
    pub fn success(message: impl Into<String>, mut data: Map<String, Value>) -> Self {
        data.remove("errors");
        Self::new(Status::Success, message.into(), data)
    }

    /// Builds a success envelope without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self::success(message, Map::new())
    }

    /// Builds an error envelope. When `errors` is empty the message itself is
    /// recorded as the single error.
    pub fn error(message: impl Into<String>, errors: Vec<String>) -> Self {
        let message = message.into();
        let errors = if errors.is_empty() {
            vec![message.clone()]
        } else {
            errors
        };
        let mut data = Map::new();
        data.insert("errors".to_owned(), Value::from(errors));
        Self::new(Status::Error, message, data)
    }

    /// Builds a partial envelope.
    ///
    /// Falls back to `success` or `error` when either list is empty so the
    /// partial invariant cannot be violated by callers.
    pub fn partial(
        message: impl Into<String>,
        affected: Vec<String>,
        errors: Vec<String>,
        mut data: Map<String, Value>,
    ) -> Self {
        if errors.is_empty() {
            data.insert("affected_objects".to_owned(), Value::from(affected));
            return Self::success(message, data);
        }
        if affected.is_empty() {
            let mut envelope = Self::error(message, errors);
            envelope.data.extend(data);
            return envelope;
        }
        data.insert("affected_objects".to_owned(), Value::from(affected));
        data.insert("errors".to_owned(), Value::from(errors));
        Self::new(Status::Partial, message.into(), data)
    }

    fn new(status: Status, message: String, data: Map<String, Value>) -> Self {
        Self {
            status,
            message,
            data,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Adds a payload field, keeping the `errors` invariants intact.
    #[must_use]
    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        if key == "errors" && self.status == Status::Success {
            return self;
        }
        self.data.insert(key.to_owned(), value.into());
        self
    }

    /// Overall status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Human-readable summary.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured payload.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Instant the envelope was produced.
    #[must_use]
    pub const fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Error strings carried in `data.errors`.
    #[must_use]
    pub fn errors(&self) -> Vec<&str> {
        self.data
            .get("errors")
            .and_then(Value::as_array)
            .map(|errors| errors.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Serialises the envelope as a JSON document.
    #[must_use]
    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|error| {
            format!(
                "{{\"status\":\"error\",\"message\":\"failed to serialise response: {error}\",\"data\":{{}},\"timestamp\":\"\"}}"
            )
            .into_bytes()
        })
    }
}

pub(crate) fn serialize_timestamp<S: Serializer>(
    timestamp: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let text = timestamp
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&text)
}

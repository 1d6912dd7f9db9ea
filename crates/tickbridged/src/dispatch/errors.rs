//! Error taxonomy for request handling.
//!
//! Each variant maps to one failure mode a caller can observe in the result
//! envelope. Batch handlers recover per-target variants locally and fold
//! them into the aggregate; request-level variants abort before any
//! mutation.

use thiserror::Error;

use crate::mutation::{CoercionError, MutationError};
use crate::wire::ResultEnvelope;

/// Errors surfaced while routing and executing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// A named target is absent from the host graph.
    #[error("object '{target}' not found")]
    NotFound { target: String },

    /// A mutation key matches neither an accessor nor a field.
    #[error("{type_name} has no member '{member}'")]
    MemberNotFound { type_name: String, member: String },

    /// A value cannot be converted to the member's native type.
    #[error("cannot set '{member}': {source}")]
    TypeCoercion {
        member: String,
        #[source]
        source: CoercionError,
    },

    /// A component type name is not in the catalog.
    #[error("unknown component type '{name}'")]
    UnknownComponent { name: String },

    /// The free-text command names no known verb.
    #[error("unknown command '{verb}'; run 'help' for the list of commands")]
    UnknownVerb { verb: String },

    /// A structured request names an operation type that does not exist.
    #[error("unknown operation '{operation}'")]
    UnknownOperation { operation: String },

    /// The request names more targets than a single batch may carry.
    #[error("batch of {count} targets exceeds the limit of {limit}")]
    BatchLimitExceeded { count: usize, limit: usize },

    /// The request is missing a required field or cannot be decoded.
    #[error("malformed request: {message}")]
    MalformedRequest { message: String },

    /// No handler is registered for the method and path.
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// The host is in a state that does not allow the operation.
    #[error("{message}")]
    InvalidState { message: String },

    /// The host stayed busy for the whole wait budget.
    #[error("host still busy after {timeout_ms} ms")]
    WaitTimeout { timeout_ms: u64 },

    /// The request arrived after the bridge stopped draining its queue.
    #[error("bridge is shutting down")]
    ShuttingDown,

    /// An uncaught fault escaped a handler.
    #[error("internal fault: {message}")]
    Internal { message: String },
}

impl BridgeError {
    /// Stable machine-readable kind, reported as `data.error_kind`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::MemberNotFound { .. } => "member_not_found",
            Self::TypeCoercion { .. } => "type_coercion",
            Self::UnknownComponent { .. } => "unknown_component",
            Self::UnknownVerb { .. } => "unknown_verb",
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::BatchLimitExceeded { .. } => "batch_limit_exceeded",
            Self::MalformedRequest { .. } => "malformed_request",
            Self::RouteNotFound { .. } => "route_not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::WaitTimeout { .. } => "wait_timeout",
            Self::ShuttingDown => "shutting_down",
            Self::Internal { .. } => "internal_fault",
        }
    }

    /// HTTP status code of the response carrying this error.
    ///
    /// Only internal faults leave the 200 range; every other failure is
    /// reported through the envelope body.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Internal { .. } => 500,
            _ => 200,
        }
    }

    /// Converts the error into an `error` envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ResultEnvelope {
        ResultEnvelope::error(self.to_string(), Vec::new()).with_data("error_kind", self.kind())
    }

    /// Creates a not-found error.
    pub fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }

    /// Creates a member-not-found error.
    pub fn member_not_found(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::MemberNotFound {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// Creates an unknown-component error.
    pub fn unknown_component(name: impl Into<String>) -> Self {
        Self::UnknownComponent { name: name.into() }
    }

    /// Creates an unknown-verb error.
    pub fn unknown_verb(verb: impl Into<String>) -> Self {
        Self::UnknownVerb { verb: verb.into() }
    }

    /// Creates an unknown-operation error.
    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    /// Creates a malformed-request error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    /// Creates a route-not-found error.
    pub fn route_not_found(method: impl ToString, path: impl Into<String>) -> Self {
        Self::RouteNotFound {
            method: method.to_string(),
            path: path.into(),
        }
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates an internal fault.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<MutationError> for BridgeError {
    fn from(error: MutationError) -> Self {
        match error {
            MutationError::MemberNotFound { type_tag, key } => Self::MemberNotFound {
                type_name: type_tag,
                member: key,
            },
            MutationError::Coercion { key, source } => Self::TypeCoercion {
                member: key,
                source,
            },
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(error: serde_json::Error) -> Self {
        Self::malformed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::wire::Status;

    #[rstest]
    #[case::not_found(BridgeError::not_found("Cube"), 200)]
    #[case::route(BridgeError::route_not_found("GET", "/unity/nope"), 200)]
    #[case::internal(BridgeError::internal("boom"), 500)]
    fn maps_http_status(#[case] error: BridgeError, #[case] expected: u16) {
        assert_eq!(error.http_status(), expected);
    }

    #[test]
    fn envelope_names_method_and_path() {
        let envelope = BridgeError::route_not_found("POST", "/unity/missing").to_envelope();
        assert_eq!(envelope.status(), Status::Error);
        assert_eq!(envelope.message(), "no route for POST /unity/missing");
        assert_eq!(envelope.errors(), vec!["no route for POST /unity/missing"]);
        assert_eq!(
            envelope.data().get("error_kind").and_then(|v| v.as_str()),
            Some("route_not_found")
        );
    }

    #[test]
    fn unknown_verb_points_to_help() {
        let message = BridgeError::unknown_verb("explode").to_string();
        assert!(message.contains("explode"));
        assert!(message.contains("help"));
    }
}

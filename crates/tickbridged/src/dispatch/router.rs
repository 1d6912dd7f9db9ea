//! Method and path routing for bridge requests.
//!
//! Exact routes are consulted first, then prefix routes (longest prefix
//! first) which hand the percent-decoded path remainder to the handler as
//! its argument. Anything else is answered with a `RouteNotFound` envelope
//! naming the method and path.

use std::collections::HashMap;
use std::fmt;

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};
use tracing::debug;

use crate::wire::{HttpRequest, Method, QueryMap, ResultEnvelope};

use super::body;
use super::context::HandlerContext;
use super::errors::BridgeError;
use super::handlers;
use super::read_options::ReadOptions;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Base path every standard route lives under.
pub const BASE_PATH: &str = "/unity";

/// A request as seen by a handler.
#[derive(Debug)]
pub struct RouteRequest<'a> {
    request: &'a HttpRequest,
    argument: Option<String>,
}

impl<'a> RouteRequest<'a> {
    /// Wraps a request without a path argument.
    #[must_use]
    pub const fn new(request: &'a HttpRequest) -> Self {
        Self {
            request,
            argument: None,
        }
    }

    /// Request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.request.method()
    }

    /// Normalised request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Decoded query parameters.
    #[must_use]
    pub const fn query(&self) -> &QueryMap {
        self.request.query()
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.request.body()
    }

    /// Decoded path remainder of a prefix route.
    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Body parsed as a JSON object; empty bodies are empty objects.
    pub fn json(&self) -> Result<Map<String, Value>, BridgeError> {
        body::parse_object(self.body())
    }

    /// Read options from the query string.
    #[must_use]
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions::from_query(self.query())
    }
}

/// Executes one routed request against host state.
pub trait Handler: Send {
    /// Handles the request, returning the envelope to send back.
    fn handle(
        &self,
        context: &mut HandlerContext<'_>,
        request: &RouteRequest<'_>,
    ) -> Result<ResultEnvelope, BridgeError>;
}

impl<F> Handler for F
where
    F: Fn(&mut HandlerContext<'_>, &RouteRequest<'_>) -> Result<ResultEnvelope, BridgeError> + Send,
{
    fn handle(
        &self,
        context: &mut HandlerContext<'_>,
        request: &RouteRequest<'_>,
    ) -> Result<ResultEnvelope, BridgeError> {
        self(context, request)
    }
}

/// Path matching rule of a registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// The whole path must match.
    Exact(String),
    /// The path must start with the prefix followed by a non-empty
    /// remainder, which becomes the handler argument.
    Prefix(String),
}

impl RoutePattern {
    /// Exact pattern.
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    /// Prefix pattern; a trailing `/` is implied.
    pub fn prefix(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.ends_with('/') {
            path.push('/');
        }
        Self::Prefix(path)
    }
}

struct PrefixRoute {
    method: Method,
    prefix: String,
    handler: Box<dyn Handler>,
}

/// Route table.
#[derive(Default)]
pub struct Router {
    exact: HashMap<(Method, String), Box<dyn Handler>>,
    prefixes: Vec<PrefixRoute>,
}

impl fmt::Debug for Router {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Router")
            .field("exact", &self.exact.len())
            .field("prefixes", &self.prefixes.len())
            .finish()
    }
}

impl Router {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every standard `/unity` route.
    #[must_use]
    pub fn standard() -> Self {
        let mut router = Self::new();
        handlers::register_standard(&mut router);
        router
    }

    /// Registers `handler`, replacing any handler with the same method and
    /// pattern.
    pub fn register(&mut self, method: Method, pattern: RoutePattern, handler: impl Handler + 'static) {
        match pattern {
            RoutePattern::Exact(path) => {
                self.exact.insert((method, path), Box::new(handler));
            }
            RoutePattern::Prefix(prefix) => {
                self.prefixes
                    .retain(|route| !(route.method == method && route.prefix == prefix));
                self.prefixes.push(PrefixRoute {
                    method,
                    prefix,
                    handler: Box::new(handler),
                });
                self.prefixes
                    .sort_by(|left, right| right.prefix.len().cmp(&left.prefix.len()));
            }
        }
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len()
    }

    /// Whether no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Routes and runs `request`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::RouteNotFound`] when nothing matches, or
    /// whatever the matched handler returns.
    pub fn dispatch(
        &self,
        context: &mut HandlerContext<'_>,
        request: &HttpRequest,
    ) -> Result<ResultEnvelope, BridgeError> {
        let method = request.method();
        let path = request.path();
        if let Some(handler) = self.exact.get(&(method, path.to_owned())) {
            debug!(target: DISPATCH_TARGET, %method, path, "exact route");
            return handler.handle(context, &RouteRequest::new(request));
        }
        for route in self.prefixes.iter().filter(|route| route.method == method) {
            let Some(remainder) = path.strip_prefix(route.prefix.as_str()) else {
                continue;
            };
            if remainder.is_empty() {
                continue;
            }
            let argument = percent_decode_str(remainder).decode_utf8_lossy().into_owned();
            debug!(
                target: DISPATCH_TARGET,
                %method,
                path,
                argument = argument.as_str(),
                "prefix route"
            );
            let routed = RouteRequest {
                request,
                argument: Some(argument),
            };
            return route.handler.handle(context, &routed);
        }
        Err(BridgeError::route_not_found(method, path))
    }
}

#[cfg(test)]
mod tests;

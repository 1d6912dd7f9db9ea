//! Socket listener for bridge transport endpoints.
//!
//! The transport binds the configured endpoint and accepts connections on a
//! background thread. It never touches host state; accepted streams are
//! handed to a [`ConnectionHandler`], which in the bridge decodes the request
//! and queues it for the coordinator. Handlers still running are counted so
//! shutdown can wait for them before the final drain.

mod errors;
mod handler;
mod in_flight;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::handler::{ConnectionHandler, ConnectionStream};
pub use self::in_flight::{InFlight, InFlightSlot};
pub use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

//! Bridge between an external controller and a host-owned object graph.
//!
//! Controllers send HTTP requests on arbitrary threads; the host only allows
//! graph mutation on its own tick. The bridge splits the two:
//!
//! 1. The **acceptor** ([`transport`] plus the coordinator's intake) decodes
//!    each connection into one [`PendingWork`] item and queues it. Pre-flight
//!    and undecodable requests are answered on the spot.
//! 2. The **coordinator** drains the queue once per host tick and executes
//!    every item in arrival order, one at a time, on the host thread.
//! 3. The **router** maps method and path to a handler. Handlers use the
//!    free-text [`command`] grammar, the generic [`mutation`] engine and the
//!    result [`aggregate`] to produce one [`ResultEnvelope`] per request.
//!
//! [`Bridge`] wires these together for an embedding application; the
//! `tickbridged` binary embeds it in a minimal reference host (see
//! [`run_bridge`]).

pub mod aggregate;
mod bootstrap;
mod bridge;
pub mod command;
pub mod coordinator;
pub mod diagnostics;
pub mod dispatch;
mod health;
pub mod host;
pub mod mutation;
mod process;
pub mod scene;
pub mod telemetry;
pub mod transport;
pub mod wire;

pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use bridge::Bridge;
pub use coordinator::{Coordinator, PendingWork, QueueClosed, TickReport, WorkQueue};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    HostLoop, LaunchError, ShutdownError, ShutdownFlag, ShutdownSignal, SystemShutdownSignal,
    run_bridge, run_bridge_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use wire::ResultEnvelope;

#[cfg(test)]
mod tests;

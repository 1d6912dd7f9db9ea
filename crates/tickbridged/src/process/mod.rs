//! Reference host process: bootstrap, bridge startup, the host loop and
//! signal-driven shutdown.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::{HostLoop, run_bridge, run_bridge_with};
pub use shutdown::{ShutdownError, ShutdownFlag, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

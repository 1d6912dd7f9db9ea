//! Runs the reference host: bootstrap, start the bridge, tick until told to
//! stop, then shut down in order.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::bridge::Bridge;
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownFlag, ShutdownSignal, SystemShutdownSignal};

/// Fixed-period host loop standing in for the host application's tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostLoop {
    interval: Duration,
}

impl HostLoop {
    /// A loop ticking every `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Advances the host and drains the bridge once per period until `flag`
    /// is raised. Returns the number of ticks run.
    ///
    /// A tick that overruns its period delays the next one instead of
    /// bunching up missed ticks.
    pub fn run(self, bridge: &mut Bridge, flag: &ShutdownFlag) -> u64 {
        let mut ticks = 0_u64;
        let mut next = Instant::now();
        while !flag.is_raised() {
            bridge.coordinator_mut().host_mut().advance();
            bridge.tick();
            ticks += 1;
            next += self.interval;
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            } else {
                next = now;
            }
        }
        ticks
    }
}

/// Runs the reference host with the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] naming the phase that failed: arming signals,
/// bootstrap, binding or stopping the acceptor.
pub fn run_bridge() -> Result<(), LaunchError> {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_bridge_with(&SystemConfigLoader, reporter, &SystemShutdownSignal)
}

/// Runs the reference host with injected collaborators.
///
/// # Errors
///
/// See [`run_bridge`].
pub fn run_bridge_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let flag = shutdown.arm()?;
    let bootstrapped = bootstrap_with(loader, reporter.as_ref())?;
    let config = bootstrapped.config();
    let mut bridge = Bridge::start(config, reporter).map_err(|source| LaunchError::Bind {
        configured: config.bridge_socket().to_string(),
        source,
    })?;
    info!(
        target: PROCESS_TARGET,
        endpoint = %bridge.endpoint(),
        tick_interval_ms = config.tick_interval_ms,
        "host loop starting"
    );

    let ticks = HostLoop::new(config.tick_interval()).run(&mut bridge, &flag);

    info!(
        target: PROCESS_TARGET,
        ticks,
        "shutdown signal received"
    );
    let endpoint = bridge.endpoint().to_string();
    let coordinator = bridge
        .shutdown()
        .map_err(|source| LaunchError::Stop { endpoint, source })?;
    info!(
        target: PROCESS_TARGET,
        processed = coordinator.stats().processed(),
        faults = coordinator.stats().faults(),
        "shutdown sequence completed"
    );
    Ok(())
}

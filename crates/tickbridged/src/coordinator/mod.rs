//! Single-writer execution of queued requests.
//!
//! Acceptor threads push [`PendingWork`] onto a shared [`WorkQueue`]; the
//! embedding application calls [`Coordinator::tick`] once per host tick on
//! the thread that owns the host graph. Each tick drains everything queued
//! at that moment and executes it in arrival order, one unit at a time,
//! writing each response before starting the next.

mod intake;
mod queue;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use tickbridge_config::Config;

use crate::diagnostics::{BridgeStats, CommandLogEntry, ExecutionRecord};
use crate::dispatch::{BridgeError, BridgeSettings, HandlerContext, Router};
use crate::health::HealthReporter;
use crate::host::Host;
use crate::wire::{ResponseWriter, ResultEnvelope};

pub use self::intake::{IntakeLimits, QueueingConnectionHandler};
pub use self::queue::{PendingWork, QueueClosed, WorkQueue};

pub(crate) const COORDINATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::coordinator");

/// What one [`Coordinator::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Units of work executed.
    pub executed: usize,
    /// Units among them that faulted.
    pub faulted: usize,
}

/// Owns the host graph and executes queued requests against it.
pub struct Coordinator {
    queue: WorkQueue,
    router: Router,
    host: Host,
    stats: BridgeStats,
    settings: BridgeSettings,
    reporter: Arc<dyn HealthReporter>,
    in_flight: usize,
    peak_concurrency: usize,
}

impl Coordinator {
    /// Builds a coordinator serving the standard routes.
    #[must_use]
    pub fn new(
        host: Host,
        settings: BridgeSettings,
        log_capacity: usize,
        reporter: Arc<dyn HealthReporter>,
    ) -> Self {
        Self {
            queue: WorkQueue::new(),
            router: Router::standard(),
            host,
            stats: BridgeStats::new(log_capacity),
            settings,
            reporter,
            in_flight: 0,
            peak_concurrency: 0,
        }
    }

    /// Builds a coordinator from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config, reporter: Arc<dyn HealthReporter>) -> Self {
        Self::new(
            Host::new(config.seed_default_scene()),
            BridgeSettings::from_config(config),
            config.command_log_capacity(),
            reporter,
        )
    }

    /// A handle producers use to queue work.
    #[must_use]
    pub fn queue(&self) -> WorkQueue {
        self.queue.clone()
    }

    /// Routes served by this coordinator; embedders register extra domain
    /// handlers here before the first tick.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// The host graph, for inspection between ticks.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    /// The host graph, for host-side changes between ticks.
    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    /// Execution counters and the command log.
    #[must_use]
    pub const fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Highest number of units ever observed executing at once.
    #[must_use]
    pub const fn peak_concurrency(&self) -> usize {
        self.peak_concurrency
    }

    /// Drains the queue and executes every drained unit in order.
    pub fn tick(&mut self) -> TickReport {
        let batch = self.queue.drain_all();
        let mut report = TickReport::default();
        for work in batch {
            let faulted = self.execute(work).1;
            report.executed += 1;
            if faulted {
                report.faulted += 1;
            }
        }
        if report.executed > 0 {
            debug!(
                target: COORDINATOR_TARGET,
                executed = report.executed,
                faulted = report.faulted,
                "tick complete"
            );
        }
        report
    }

    /// Runs one unit of work to completion: dispatch, respond, record.
    ///
    /// A panicking handler is answered with an internal-fault envelope and
    /// HTTP 500; the coordinator stays usable. Returns the log entry and
    /// whether the unit faulted.
    pub fn execute(&mut self, work: PendingWork) -> (CommandLogEntry, bool) {
        let (request, mut sink, accepted_at) = work.into_parts();
        let started = Instant::now();

        self.in_flight += 1;
        self.peak_concurrency = self.peak_concurrency.max(self.in_flight);
        let outcome = {
            let Self {
                router,
                host,
                stats,
                settings,
                ..
            } = self;
            let mut context = HandlerContext::new(host, stats, settings);
            panic::catch_unwind(AssertUnwindSafe(|| router.dispatch(&mut context, &request)))
        };
        self.in_flight -= 1;
        let elapsed = started.elapsed();

        let (status_code, envelope, fault): (u16, ResultEnvelope, bool) = match outcome {
            Ok(Ok(envelope)) => (200, envelope, false),
            Ok(Err(error)) => {
                let fault = matches!(error, BridgeError::Internal { .. });
                if fault {
                    self.reporter.coordinator_fault(request.path(), &error);
                }
                (error.http_status(), error.to_envelope(), fault)
            }
            Err(payload) => {
                let error = BridgeError::internal(panic_message(payload.as_ref()));
                self.reporter.coordinator_fault(request.path(), &error);
                (error.http_status(), error.to_envelope(), true)
            }
        };

        if let Err(error) = ResponseWriter::new(&mut sink).write_envelope(status_code, &envelope) {
            warn!(
                target: COORDINATOR_TARGET,
                path = request.path(),
                error = %error,
                "failed to write response"
            );
        }
        drop(sink);

        let entry = self.stats.record(ExecutionRecord {
            endpoint: request.path().to_owned(),
            method: request.method(),
            status: envelope.status(),
            message: envelope.message().to_owned(),
            elapsed,
            fault,
        });
        debug!(
            target: COORDINATOR_TARGET,
            sequence = entry.sequence,
            method = %request.method(),
            path = request.path(),
            status = %envelope.status(),
            queued_ms = u64::try_from(started.duration_since(accepted_at).as_millis())
                .unwrap_or(u64::MAX),
            "unit of work executed"
        );
        (entry, fault)
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("queued", &self.queue.len())
            .field("routes", &self.router.len())
            .field("processed", &self.stats.processed())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("handler panicked"))
}

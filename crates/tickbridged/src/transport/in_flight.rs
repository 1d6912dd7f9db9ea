//! Count of connection threads that have been accepted but not yet handed
//! their request to the coordinator.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Shared counter of live connection threads. Clones observe one count.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<(Mutex<usize>, Condvar)>,
}

impl InFlight {
    /// Registers one connection; the count drops again when the returned
    /// slot is dropped.
    #[must_use]
    pub fn enter(&self) -> InFlightSlot {
        *self.lock() += 1;
        InFlightSlot {
            owner: self.clone(),
        }
    }

    /// Connections currently registered.
    #[must_use]
    pub fn count(&self) -> usize {
        *self.lock()
    }

    /// Blocks until no connection is registered or `grace` elapses.
    /// Returns the number still registered.
    #[must_use]
    pub fn wait_idle(&self, grace: Duration) -> usize {
        let deadline = Instant::now() + grace;
        let (_, idle) = &*self.inner;
        let mut count = self.lock();
        while *count > 0 {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            if remaining.is_zero() {
                break;
            }
            count = idle
                .wait_timeout(count, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *count
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn leave(&self) {
        let mut count = self.lock();
        *count = count.saturating_sub(1);
        self.inner.1.notify_all();
    }
}

/// Registration held by one connection thread.
#[derive(Debug)]
pub struct InFlightSlot {
    owner: InFlight,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.owner.leave();
    }
}

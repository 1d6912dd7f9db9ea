//! FIFO hand-off between acceptor threads and the coordinator.

use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::wire::HttpRequest;

/// One decoded request bound to the connection that must receive its
/// response. Executed exactly once, then dropped, which closes the
/// connection.
pub struct PendingWork {
    request: HttpRequest,
    sink: Box<dyn Write + Send>,
    accepted_at: Instant,
}

impl PendingWork {
    /// Binds `request` to the writer its response goes to.
    pub fn new(request: HttpRequest, sink: impl Write + Send + 'static) -> Self {
        Self {
            request,
            sink: Box::new(sink),
            accepted_at: Instant::now(),
        }
    }

    /// The decoded request.
    #[must_use]
    pub const fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// When the acceptor queued this unit.
    #[must_use]
    pub const fn accepted_at(&self) -> Instant {
        self.accepted_at
    }

    pub(super) fn into_parts(self) -> (HttpRequest, Box<dyn Write + Send>, Instant) {
        (self.request, self.sink, self.accepted_at)
    }
}

impl fmt::Debug for PendingWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWork")
            .field("method", &self.request.method())
            .field("path", &self.request.path())
            .field("accepted_at", &self.accepted_at)
            .finish_non_exhaustive()
    }
}

/// Returned by [`WorkQueue::push`] once the queue is closed; hands the
/// unit back so the producer can answer it itself.
#[derive(Debug)]
pub struct QueueClosed(pub Box<PendingWork>);

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<PendingWork>,
    closed: bool,
}

/// Mutex-guarded queue of [`PendingWork`]. Clones share the same queue.
///
/// The queue holds plain data, so a poisoned lock is recovered rather than
/// propagated.
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    inner: Arc<Mutex<QueueState>>,
}

impl WorkQueue {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `work` behind everything already queued.
    ///
    /// # Errors
    ///
    /// Returns the unit inside [`QueueClosed`] when [`WorkQueue::close`] has
    /// been called.
    pub fn push(&self, work: PendingWork) -> Result<(), QueueClosed> {
        let mut state = self.lock();
        if state.closed {
            return Err(QueueClosed(Box::new(work)));
        }
        state.items.push_back(work);
        Ok(())
    }

    /// Refuses further pushes. Items already queued stay for the next drain.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Whether [`WorkQueue::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Removes and returns every queued item, oldest first, in one step.
    /// Items pushed afterwards wait for the next drain.
    #[must_use]
    pub fn drain_all(&self) -> VecDeque<PendingWork> {
        mem::take(&mut self.lock().items)
    }

    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Connection handlers used by the listener tests.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
    mpsc::Receiver,
};
use std::time::Duration;

use super::{ConnectionHandler, ConnectionStream};

/// Counts accepted connections, optionally holding each one until a release
/// signal arrives, then drops it unanswered.
pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
    release: Option<Mutex<Receiver<()>>>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        Self::build(None)
    }

    /// Each connection blocks until one `()` is sent on `release`, or five
    /// seconds pass.
    pub(crate) fn held(release: Receiver<()>) -> (Arc<AtomicUsize>, Arc<Self>) {
        Self::build(Some(Mutex::new(release)))
    }

    fn build(release: Option<Mutex<Receiver<()>>>) -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
            release,
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _stream: ConnectionStream) {
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.release {
            let release = release.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = release.recv_timeout(Duration::from_secs(5));
        }
    }
}

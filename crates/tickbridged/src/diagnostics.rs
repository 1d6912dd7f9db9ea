//! Execution counters and the bounded command log.
//!
//! [`BridgeStats`] is owned by the coordinator and passed by reference to the
//! handlers that report it; nothing here is global.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;
use time::OffsetDateTime;

use crate::wire::{Method, Status, serialize_timestamp};

/// One executed unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLogEntry {
    /// Monotonically increasing execution number.
    pub sequence: u64,
    /// Completion instant.
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: OffsetDateTime,
    /// Request path.
    pub endpoint: String,
    /// Request method.
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// Envelope status.
    pub status: Status,
    /// Envelope message.
    pub message: String,
    /// Wall-clock execution time.
    pub execution_time_ms: f64,
}

fn serialize_method<S: serde::Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(method)
}

/// Fixed-capacity ring of [`CommandLogEntry`] values; the oldest entry is
/// evicted first.
#[derive(Debug, Clone)]
pub struct CommandLog {
    capacity: usize,
    entries: VecDeque<CommandLogEntry>,
}

impl CommandLog {
    /// Creates an empty ring holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn push(&mut self, entry: CommandLogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CommandLogEntry> {
        self.entries.iter()
    }

    /// Up to `limit` most recent entries, oldest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<CommandLogEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ring is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// What the coordinator learned from executing one unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    /// Request path.
    pub endpoint: String,
    /// Request method.
    pub method: Method,
    /// Envelope status.
    pub status: Status,
    /// Envelope message.
    pub message: String,
    /// Time spent in the handler.
    pub elapsed: Duration,
    /// Whether the handler faulted.
    pub fault: bool,
}

/// Counters plus the command log.
#[derive(Debug, Clone)]
pub struct BridgeStats {
    processed: u64,
    succeeded: u64,
    partial: u64,
    failed: u64,
    faults: u64,
    next_sequence: u64,
    started_at: Instant,
    log: CommandLog,
}

/// Serialisable point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Units of work executed.
    pub processed: u64,
    /// Units that reported `success`.
    pub succeeded: u64,
    /// Units that reported `partial`.
    pub partial: u64,
    /// Units that reported `error`.
    pub failed: u64,
    /// Units whose handler faulted.
    pub faults: u64,
    /// Seconds since the bridge started.
    pub uptime_seconds: f64,
    /// Log ring contents, oldest first.
    pub log: Vec<CommandLogEntry>,
}

impl BridgeStats {
    /// Creates empty stats with a log ring of `log_capacity`.
    #[must_use]
    pub fn new(log_capacity: usize) -> Self {
        Self {
            processed: 0,
            succeeded: 0,
            partial: 0,
            failed: 0,
            faults: 0,
            next_sequence: 0,
            started_at: Instant::now(),
            log: CommandLog::new(log_capacity),
        }
    }

    /// Records one executed unit of work and returns its log entry.
    pub fn record(&mut self, record: ExecutionRecord) -> CommandLogEntry {
        self.processed += 1;
        match record.status {
            Status::Success => self.succeeded += 1,
            Status::Partial => self.partial += 1,
            Status::Error => self.failed += 1,
        }
        if record.fault {
            self.faults += 1;
        }
        self.next_sequence += 1;
        let entry = CommandLogEntry {
            sequence: self.next_sequence,
            timestamp: OffsetDateTime::now_utc(),
            endpoint: record.endpoint,
            method: record.method,
            status: record.status,
            message: record.message,
            execution_time_ms: record.elapsed.as_secs_f64() * 1000.0,
        };
        self.log.push(entry.clone());
        entry
    }

    /// Clears counters and the log. Sequence numbers keep increasing.
    pub fn reset(&mut self) {
        self.processed = 0;
        self.succeeded = 0;
        self.partial = 0;
        self.failed = 0;
        self.faults = 0;
        self.log.clear();
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed,
            succeeded: self.succeeded,
            partial: self.partial,
            failed: self.failed,
            faults: self.faults,
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
            log: self.log.iter().cloned().collect(),
        }
    }

    /// Units of work executed since the last reset.
    #[must_use]
    pub const fn processed(&self) -> u64 {
        self.processed
    }

    /// Handler faults since the last reset.
    #[must_use]
    pub const fn faults(&self) -> u64 {
        self.faults
    }

    /// The command log.
    #[must_use]
    pub const fn log(&self) -> &CommandLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    fn record(endpoint: &str, status: Status) -> ExecutionRecord {
        ExecutionRecord {
            endpoint: endpoint.to_owned(),
            method: Method::Post,
            status,
            message: String::from("done"),
            elapsed: Duration::from_micros(1500),
            fault: false,
        }
    }

    #[fixture]
    fn stats() -> BridgeStats {
        BridgeStats::new(3)
    }

    #[rstest]
    fn ring_evicts_oldest_first(mut stats: BridgeStats) {
        for index in 0..5 {
            stats.record(record(&format!("/e{index}"), Status::Success));
        }
        let endpoints: Vec<_> = stats.log().iter().map(|e| e.endpoint.as_str()).collect();
        assert_eq!(endpoints, vec!["/e2", "/e3", "/e4"]);
        assert_eq!(stats.processed(), 5);
    }

    #[rstest]
    fn counts_by_status(mut stats: BridgeStats) {
        stats.record(record("/a", Status::Success));
        stats.record(record("/b", Status::Partial));
        let mut faulted = record("/c", Status::Error);
        faulted.fault = true;
        stats.record(faulted);
        let snapshot = stats.snapshot();
        assert_eq!(
            (snapshot.succeeded, snapshot.partial, snapshot.failed, snapshot.faults),
            (1, 1, 1, 1)
        );
    }

    #[rstest]
    fn reset_clears_counters_but_not_sequence(mut stats: BridgeStats) {
        stats.record(record("/a", Status::Success));
        stats.reset();
        assert_eq!(stats.processed(), 0);
        assert!(stats.log().is_empty());
        let entry = stats.record(record("/b", Status::Success));
        assert_eq!(entry.sequence, 2);
    }

    #[test]
    fn entries_serialise_in_camel_case() {
        let mut stats = BridgeStats::new(1);
        let entry = stats.record(record("/unity/status", Status::Success));
        let json = serde_json::to_value(&entry).expect("serialise");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["status"], "success");
        let elapsed = json["executionTimeMs"].as_f64().expect("number");
        assert!((elapsed - 1.5).abs() < 1e-9);
    }

    #[test]
    fn recent_returns_tail() {
        let mut stats = BridgeStats::new(10);
        for index in 0..4 {
            stats.record(record(&format!("/e{index}"), Status::Success));
        }
        let tail = stats.log().recent(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].endpoint, "/e2");
    }
}

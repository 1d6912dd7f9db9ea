//! Result aggregation across the targets of a batch.
//!
//! Status follows the aggregation law over `s` successes and `f` failures:
//! `success` iff `f = 0 ∧ s > 0`, `error` iff `s = 0`, otherwise `partial`.
//! A skipped target counts as a success only while nothing failed. Once a
//! failure is present, `partial` needs at least one applied target, so a
//! batch made of skips and failures alone reports `error`.

use std::fmt;

use serde_json::{Map, Value};

use crate::dispatch::BridgeError;
use crate::wire::ResultEnvelope;

/// Outcome of one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The operation took effect.
    Applied,
    /// The target was intentionally left alone (e.g. deleting a missing
    /// object).
    Skipped(String),
    /// The operation failed for this target.
    Failed(String),
}

/// Per-target outcomes collected while a handler walks a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    items: Vec<(String, ItemOutcome)>,
}

impl BatchReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome for `target`.
    pub fn record(&mut self, target: impl Into<String>, outcome: ItemOutcome) {
        self.items.push((target.into(), outcome));
    }

    /// Records a success.
    pub fn applied(&mut self, target: impl Into<String>) {
        self.record(target, ItemOutcome::Applied);
    }

    /// Records a skip.
    pub fn skipped(&mut self, target: impl Into<String>, reason: impl fmt::Display) {
        self.record(target, ItemOutcome::Skipped(reason.to_string()));
    }

    /// Records a failure.
    pub fn failed(&mut self, target: impl Into<String>, reason: impl fmt::Display) {
        self.record(target, ItemOutcome::Failed(reason.to_string()));
    }

    /// Records the result of one item.
    pub fn record_result<E: fmt::Display>(&mut self, target: impl Into<String>, result: Result<(), E>) {
        match result {
            Ok(()) => self.applied(target),
            Err(error) => self.failed(target, error),
        }
    }

    /// Number of items that count as successes.
    #[must_use]
    pub fn successes(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, ItemOutcome::Failed(_)))
            .count()
    }

    /// Number of failed items.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.items.len() - self.successes()
    }

    /// Targets with at least one applied item, deduplicated in first-seen
    /// order.
    #[must_use]
    pub fn affected(&self) -> Vec<String> {
        let mut affected: Vec<String> = Vec::new();
        for (target, outcome) in &self.items {
            if *outcome == ItemOutcome::Applied && !affected.contains(target) {
                affected.push(target.clone());
            }
        }
        affected
    }

    /// Target-qualified failure reasons, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|(target, outcome)| match outcome {
                ItemOutcome::Failed(reason) => Some(format!("{target}: {reason}")),
                _ => None,
            })
            .collect()
    }

    fn skipped_targets(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|(target, outcome)| match outcome {
                ItemOutcome::Skipped(_) => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    /// Folds the report into one envelope.
    #[must_use]
    pub fn into_envelope(self, action: &str) -> ResultEnvelope {
        self.into_envelope_with(action, Map::new())
    }

    /// Folds the report into one envelope carrying extra payload fields.
    #[must_use]
    pub fn into_envelope_with(self, action: &str, mut data: Map<String, Value>) -> ResultEnvelope {
        let affected = self.affected();
        let errors = self.errors();
        let skipped = self.skipped_targets();
        let successes = self.successes();

        data.insert("count".to_owned(), Value::from(affected.len()));
        if !skipped.is_empty() {
            data.insert("skipped".to_owned(), Value::from(skipped));
        }

        if self.items.is_empty() {
            return ResultEnvelope::error(format!("{action}: no targets processed"), Vec::new());
        }
        if errors.is_empty() {
            let message = if affected.is_empty() {
                format!("{action}: no changes applied")
            } else {
                format!("{action}: {} object(s) affected", affected.len())
            };
            data.insert("affected_objects".to_owned(), Value::from(affected));
            return ResultEnvelope::success(message, data);
        }
        if affected.is_empty() {
            let message = format!("{action} failed for {} target(s)", errors.len());
            let mut envelope = ResultEnvelope::error(message, errors);
            for (key, value) in data {
                envelope = envelope.with_data(&key, value);
            }
            return envelope;
        }
        let message = format!(
            "{action}: {successes} succeeded, {} failed",
            errors.len()
        );
        ResultEnvelope::partial(message, affected, errors, data)
    }
}

/// Rejects batches naming more than `limit` targets.
pub fn enforce_batch_limit(count: usize, limit: usize) -> Result<(), BridgeError> {
    if count > limit {
        return Err(BridgeError::BatchLimitExceeded { count, limit });
    }
    Ok(())
}

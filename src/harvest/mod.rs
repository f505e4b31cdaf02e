//! Batch harvesting
//!
//! This module drives the extraction pipeline over identifier ranges:
//! - Per-entry extraction (fetch, name lookup, assembly)
//! - Bounded concurrency across entries
//! - Aggregation of records and failures
//! - Cancellation between entries

mod harvester;

pub use harvester::Harvester;

use crate::extract::ScpRecord;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation switch for a batch run
///
/// Checked before each entry starts; entries already in flight finish.
/// A cancel raised between runs stops the next run, and every run clears
/// the flag when it returns so the harvester can be run again.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Result of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Successful records keyed by numeric identifier
    pub records: BTreeMap<u32, ScpRecord>,

    /// Identifiers whose extraction aborted, ascending
    pub failed_ids: Vec<u32>,

    /// Why each failed identifier aborted
    pub failure_reasons: BTreeMap<u32, String>,

    /// Whether the run stopped early
    pub cancelled: bool,
}

impl BatchOutcome {
    /// Number of identifiers that were attempted
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failed_ids.len()
    }

    /// Number of records carrying the missing-fields marker
    pub fn warnings(&self) -> usize {
        self.records.values().filter(|r| r.has_warning()).count()
    }

    pub(crate) fn record_success(&mut self, id: u32, record: ScpRecord) {
        self.records.insert(id, record);
    }

    pub(crate) fn record_failure(&mut self, id: u32, reason: String) {
        self.failed_ids.push(id);
        self.failure_reasons.insert(id, reason);
    }

    pub(crate) fn finish(&mut self, cancelled: bool) {
        self.failed_ids.sort_unstable();
        self.failed_ids.dedup();
        self.cancelled = cancelled;
    }
}

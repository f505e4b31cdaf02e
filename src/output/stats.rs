//! Run statistics
//!
//! This module summarizes a finished batch for the terminal.

use crate::harvest::BatchOutcome;
use std::collections::BTreeMap;
use std::time::Duration;

/// Field names counted in the coverage table, in display order
const COVERED_FIELDS: &[&str] = &["name", "class", "containment", "description", "images", "tags"];

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Identifiers attempted
    pub attempted: usize,

    /// Records produced
    pub succeeded: usize,

    /// Identifiers that aborted
    pub failed_ids: Vec<u32>,

    /// Records carrying the missing-fields marker
    pub warnings: usize,

    /// Records lacking at least one primary field
    pub incomplete: usize,

    /// How many records have each field present
    pub field_coverage: BTreeMap<&'static str, usize>,

    /// Records per series
    pub records_by_series: BTreeMap<u32, usize>,

    /// Whether the run stopped early
    pub cancelled: bool,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunStatistics {
    /// Fraction of attempted identifiers that produced a record, in percent
    pub fn success_rate(&self) -> f64 {
        if self.attempted > 0 {
            (self.succeeded as f64 / self.attempted as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Computes statistics for a finished run
pub fn collect_statistics(outcome: &BatchOutcome, elapsed: Duration) -> RunStatistics {
    let mut field_coverage: BTreeMap<&'static str, usize> =
        COVERED_FIELDS.iter().map(|field| (*field, 0)).collect();
    let mut records_by_series = BTreeMap::new();

    for record in outcome.records.values() {
        let present = [
            record.name.is_some(),
            record.class.is_some(),
            record.containment.is_some(),
            record.description.is_some(),
            !record.images.is_empty(),
            !record.tags.is_empty(),
        ];
        for (field, present) in COVERED_FIELDS.iter().zip(present) {
            if present {
                *field_coverage.entry(*field).or_default() += 1;
            }
        }
        *records_by_series.entry(record.series).or_default() += 1;
    }

    RunStatistics {
        attempted: outcome.attempted(),
        succeeded: outcome.records.len(),
        failed_ids: outcome.failed_ids.clone(),
        warnings: outcome.warnings(),
        incomplete: outcome
            .records
            .values()
            .filter(|record| !record.missing_fields.is_empty())
            .count(),
        field_coverage,
        records_by_series,
        cancelled: outcome.cancelled,
        elapsed,
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Entries attempted: {}", stats.attempted);
    println!("  Records written: {}", stats.succeeded);
    println!("  Failed: {}", stats.failed_ids.len());
    println!("  Missing some standard fields: {}", stats.incomplete);
    println!("  Without standard fields: {}", stats.warnings);
    println!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
    if stats.cancelled {
        println!("  Run was cancelled before completion");
    }
    println!();

    if stats.succeeded > 0 {
        println!("Field Coverage:");
        for field in COVERED_FIELDS {
            let count = stats.field_coverage.get(field).copied().unwrap_or(0);
            let percentage = (count as f64 / stats.succeeded as f64) * 100.0;
            println!("  {}: {} ({:.1}%)", field, count, percentage);
        }
        println!();

        println!("Records by Series:");
        for (series, count) in &stats.records_by_series {
            println!("  Series {}: {}", series, count);
        }
        println!();
    }

    if !stats.failed_ids.is_empty() {
        println!("Failed IDs ({}):", stats.failed_ids.len());
        let ids: Vec<String> = stats.failed_ids.iter().map(u32::to_string).collect();
        println!("  {}", ids.join(", "));
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} entries extracted)",
        stats.success_rate(),
        stats.succeeded,
        stats.attempted
    );
}

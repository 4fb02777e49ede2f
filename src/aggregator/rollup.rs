//! Calendar rollup: year -> group -> monthly totals.
//!
//! Unlike the bucketed series this view uses calendar boundaries taken
//! from each record's own date, so it needs no window.

use super::accumulator::{GroupKey, MetricAccumulator, SkipStats};
use super::normalizer::{NormalizedRecord, RecordTime};
use chrono::Datelike;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Twelve monthly accumulators and their sum for one group in one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearGroup {
    /// First-seen display name
    pub name: String,

    /// January first
    pub months: [MetricAccumulator; 12],

    pub total: MetricAccumulator,
}

impl YearGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            months: [MetricAccumulator::default(); 12],
            total: MetricAccumulator::default(),
        }
    }
}

/// Per-year, per-group calendar totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyRollup {
    pub years: BTreeMap<i32, BTreeMap<GroupKey, YearGroup>>,

    /// Undated records, left out of the rollup
    pub skipped: SkipStats,
}

impl YearlyRollup {
    /// Totals for one group across all years
    pub fn group_total(&self, key: &GroupKey) -> MetricAccumulator {
        self.years
            .values()
            .filter_map(|groups| groups.get(key))
            .map(|year| year.total)
            .sum()
    }
}

/// Roll dated records up by calendar year and month
///
/// **Public** - records without a usable date are counted, never placed
pub fn yearly_rollup(records: &[NormalizedRecord]) -> YearlyRollup {
    let mut rollup = YearlyRollup::default();

    for record in records {
        let ts = match &record.timestamp {
            RecordTime::At(ts) => *ts,
            RecordTime::Missing => {
                rollup.skipped.missing_timestamp += 1;
                continue;
            }
            RecordTime::Unparseable(_) => {
                rollup.skipped.unparseable_timestamp += 1;
                continue;
            }
        };

        let entry = rollup
            .years
            .entry(ts.year())
            .or_default()
            .entry(record.group_key.clone())
            .or_insert_with(|| YearGroup::new(&record.group_name));

        entry.months[ts.month0() as usize].record(record.kind, record.word_count);
        entry.total.record(record.kind, record.word_count);
    }

    debug!(
        "Rolled up {} records into {} years ({} undated)",
        records.len(),
        rollup.years.len(),
        rollup.skipped.total()
    );

    rollup
}

//! Group keys and metric accumulators.
//!
//! An accumulator only ever grows within one aggregation run. The derived
//! ratio is computed on read, never stored.

use crate::parser::schema::RecordKind;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign};

/// Canonical group identifier (the title number)
///
/// Ordering is numeric when both keys are integers, so titles list as
/// 1, 2, ..., 10 rather than 1, 10, 2. Numeric keys sort before others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse::<u64>().ok()
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Word, section and part counters for one group (or group x bucket)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricAccumulator {
    pub word_count: u64,
    pub section_count: u64,
    pub part_count: u64,
}

impl MetricAccumulator {
    /// Count one record
    ///
    /// `Other` records add words only.
    pub fn record(&mut self, kind: RecordKind, words: u64) {
        self.word_count = self.word_count.saturating_add(words);
        match kind {
            RecordKind::Section => self.section_count = self.section_count.saturating_add(1),
            RecordKind::Part => self.part_count = self.part_count.saturating_add(1),
            RecordKind::Other => {}
        }
    }

    /// `word_count / max(section_count, 1)`; always finite and non-negative
    pub fn avg_words_per_section(&self) -> f64 {
        self.word_count as f64 / self.section_count.max(1) as f64
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Section count used as a ratio denominator
    ///
    /// `max(section_count, 1)` for an accumulator that saw records, zero
    /// for an untouched one, so empty groups do not dilute combined ratios.
    pub fn ratio_denominator(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.section_count.max(1)
        }
    }
}

impl AddAssign for MetricAccumulator {
    fn add_assign(&mut self, other: Self) {
        self.word_count = self.word_count.saturating_add(other.word_count);
        self.section_count = self.section_count.saturating_add(other.section_count);
        self.part_count = self.part_count.saturating_add(other.part_count);
    }
}

impl Add for MetricAccumulator {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl std::iter::Sum for MetricAccumulator {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Flat totals and display name for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotals {
    /// First-seen display name
    pub name: String,

    pub metrics: MetricAccumulator,
}

/// Counts of records left out of a view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipStats {
    /// No usable title number; excluded from every view
    pub missing_entity: u64,

    /// No date; excluded from time-series views
    pub missing_timestamp: u64,

    /// Date present but unparseable; excluded from time-series views
    pub unparseable_timestamp: u64,

    /// Dated, but no buckets were generated to hold it
    pub outside_buckets: u64,
}

impl SkipStats {
    pub fn total(&self) -> u64 {
        self.missing_entity + self.missing_timestamp + self.unparseable_timestamp + self.outside_buckets
    }
}

impl AddAssign for SkipStats {
    fn add_assign(&mut self, other: Self) {
        self.missing_entity += other.missing_entity;
        self.missing_timestamp += other.missing_timestamp;
        self.unparseable_timestamp += other.unparseable_timestamp;
        self.outside_buckets += other.outside_buckets;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_numeric_order() {
        let mut keys = vec![
            GroupKey::from("10"),
            GroupKey::from("2"),
            GroupKey::from("appendix"),
            GroupKey::from("1"),
        ];
        keys.sort();
        let ordered: Vec<&str> = keys.iter().map(GroupKey::as_str).collect();
        assert_eq!(ordered, vec!["1", "2", "10", "appendix"]);
    }

    #[test]
    fn test_record_kinds() {
        let mut acc = MetricAccumulator::default();
        acc.record(RecordKind::Section, 3);
        acc.record(RecordKind::Part, 2);
        acc.record(RecordKind::Other, 5);

        assert_eq!(acc.word_count, 10);
        assert_eq!(acc.section_count, 1);
        assert_eq!(acc.part_count, 1);
    }

    #[test]
    fn test_avg_words_per_section_zero_sections() {
        let acc = MetricAccumulator {
            word_count: 50,
            section_count: 0,
            part_count: 0,
        };
        assert_eq!(acc.avg_words_per_section(), 50.0);
        assert_eq!(MetricAccumulator::default().avg_words_per_section(), 0.0);
    }

    #[test]
    fn test_accumulator_sum() {
        let total: MetricAccumulator = vec![
            MetricAccumulator { word_count: 100, section_count: 10, part_count: 1 },
            MetricAccumulator { word_count: 50, section_count: 1, part_count: 0 },
        ]
        .into_iter()
        .sum();

        assert_eq!(total.word_count, 150);
        assert_eq!(total.section_count, 11);
        assert_eq!(total.part_count, 1);
    }
}

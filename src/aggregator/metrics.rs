//! Metric selection over aggregate results.
//!
//! Turns an `AggregateResult` into the rows a chart consumes: one value per
//! group for the flat view, one value per bucket for the time-series view.

use super::accumulator::{GroupKey, MetricAccumulator};
use super::engine::AggregateResult;
use super::normalizer::split_entity_label;
use crate::utils::config::{ALL_GROUPS_LABEL, ALL_GROUP_ALIASES};
use crate::utils::error::EngineError;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A value that can be read off an accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum Metric {
    WordCount,
    SectionCount,
    PartCount,
    AvgWordsPerSection,
}

impl Metric {
    pub fn all() -> [Metric; 4] {
        [
            Metric::WordCount,
            Metric::SectionCount,
            Metric::PartCount,
            Metric::AvgWordsPerSection,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::WordCount => "wordCount",
            Metric::SectionCount => "sectionCount",
            Metric::PartCount => "partCount",
            Metric::AvgWordsPerSection => "avgWordsPerSection",
        }
    }

    /// Chart heading for this metric
    pub fn description(&self) -> &'static str {
        match self {
            Metric::WordCount => "Total Word Count per Title",
            Metric::SectionCount => "Number of Sections per Title",
            Metric::PartCount => "Number of Parts per Title",
            Metric::AvgWordsPerSection => "Average Words per Section",
        }
    }

    /// Read this metric from an accumulator
    ///
    /// The ratio is derived from the accumulator's own sums, so a summed
    /// accumulator yields a ratio of sums.
    pub fn value(&self, acc: &MetricAccumulator) -> f64 {
        match self {
            Metric::WordCount => acc.word_count as f64,
            Metric::SectionCount => acc.section_count as f64,
            Metric::PartCount => acc.part_count as f64,
            Metric::AvgWordsPerSection => acc.avg_words_per_section(),
        }
    }

    /// Read this metric across several accumulators as one value
    ///
    /// Counters are summed. The ratio divides the summed word count by the
    /// summed per-accumulator denominators (`max(sections, 1)` for each
    /// accumulator that saw records), never averaging the ratios.
    pub fn combined_value<'a, I>(&self, accumulators: I) -> f64
    where
        I: IntoIterator<Item = &'a MetricAccumulator>,
    {
        match self {
            Metric::AvgWordsPerSection => {
                let (words, sections) = accumulators.into_iter().fold((0u64, 0u64), |(w, s), acc| {
                    (
                        w.saturating_add(acc.word_count),
                        s.saturating_add(acc.ratio_denominator()),
                    )
                });
                words as f64 / sections.max(1) as f64
            }
            _ => accumulators.into_iter().map(|acc| self.value(acc)).sum(),
        }
    }

    /// True for metrics that are plain counters
    pub fn is_additive(&self) -> bool {
        !matches!(self, Metric::AvgWordsPerSection)
    }
}

impl FromStr for Metric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "wordcount" => Ok(Metric::WordCount),
            "sectioncount" => Ok(Metric::SectionCount),
            "partcount" => Ok(Metric::PartCount),
            "avgwordspersection" => Ok(Metric::AvgWordsPerSection),
            _ => Err(EngineError::InvalidMetric(s.to_string())),
        }
    }
}

impl TryFrom<String> for Metric {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which groups a view covers
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum GroupFilter {
    #[default]
    All,
    Group(GroupKey),
}

impl GroupFilter {
    /// Parse a filter value
    ///
    /// `"All"` and `"All Titles"` select every group. A full label such as
    /// `"7—Agriculture"` is reduced to its key. Anything without a usable key
    /// becomes a filter that matches no group.
    pub fn parse(value: &str, delimiter: &str) -> Self {
        let value = value.trim();

        if ALL_GROUP_ALIASES
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(value))
        {
            return GroupFilter::All;
        }

        match split_entity_label(value, delimiter) {
            Some((key, _)) => GroupFilter::Group(GroupKey::new(key)),
            None => GroupFilter::Group(GroupKey::new(value)),
        }
    }
}

impl fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupFilter::All => f.write_str(ALL_GROUPS_LABEL),
            GroupFilter::Group(key) => write!(f, "{}", key),
        }
    }
}

/// One bar of the flat view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    pub key: String,
    pub label: String,
    pub value: f64,
}

/// One value on a time axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub bucket: DateTime<Utc>,
    pub value: f64,
}

/// One line of the time-series view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub key: String,
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

/// Select a flat view
///
/// **Public** - `All` yields one row per group in key order; an unknown
/// group yields no rows.
pub fn select_flat(result: &AggregateResult, metric: Metric, filter: &GroupFilter) -> Vec<FlatRow> {
    let row = |key: &GroupKey, name: &str, acc: &MetricAccumulator| FlatRow {
        key: key.to_string(),
        label: name.to_string(),
        value: metric.value(acc),
    };

    let rows: Vec<FlatRow> = match filter {
        GroupFilter::All => result
            .groups
            .iter()
            .map(|(key, totals)| row(key, &totals.name, &totals.metrics))
            .collect(),
        GroupFilter::Group(key) => result
            .groups
            .get(key)
            .map(|totals| row(key, &totals.name, &totals.metrics))
            .into_iter()
            .collect(),
    };

    debug!("Selected {} flat rows for {} ({})", rows.len(), metric, filter);

    rows
}

/// One combined row across every group of the flat view
///
/// Used for totals lines; the ratio is a ratio of sums.
pub fn select_total(result: &AggregateResult, metric: Metric) -> FlatRow {
    FlatRow {
        key: ALL_GROUPS_LABEL.to_string(),
        label: ALL_GROUPS_LABEL.to_string(),
        value: metric.combined_value(result.groups.values().map(|totals| &totals.metrics)),
    }
}

/// Select a time-series view
///
/// **Public** - `All` yields a single synthetic row holding the bucket-wise
/// sum across groups; ratios are recomputed from the summed counters. An
/// unknown group, or a result without buckets, yields no rows.
pub fn select_series(
    result: &AggregateResult,
    metric: Metric,
    filter: &GroupFilter,
) -> Vec<SeriesRow> {
    let Some(bucketed) = &result.series else {
        return Vec::new();
    };
    let series = &bucketed.data;

    let to_points = |values: Vec<f64>| -> Vec<SeriesPoint> {
        series
            .buckets
            .iter()
            .zip(values)
            .map(|(bucket, value)| SeriesPoint {
                bucket: *bucket,
                value,
            })
            .collect()
    };

    let rows: Vec<SeriesRow> = match filter {
        GroupFilter::All => {
            let values = (0..series.buckets.len())
                .map(|index| {
                    metric.combined_value(series.groups.values().filter_map(|s| s.get(index)))
                })
                .collect();

            vec![SeriesRow {
                key: ALL_GROUPS_LABEL.to_string(),
                label: ALL_GROUPS_LABEL.to_string(),
                points: to_points(values),
            }]
        }
        GroupFilter::Group(key) => series
            .groups
            .get(key)
            .map(|accumulators| SeriesRow {
                key: key.to_string(),
                label: result
                    .groups
                    .get(key)
                    .map(|totals| totals.name.clone())
                    .unwrap_or_else(|| key.to_string()),
                points: to_points(accumulators.iter().map(|acc| metric.value(acc)).collect()),
            })
            .into_iter()
            .collect(),
    };

    debug!("Selected {} series rows for {} ({})", rows.len(), metric, filter);

    rows
}

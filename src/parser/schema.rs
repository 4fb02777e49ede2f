//! JSON schema definitions for record input and report output.
//!
//! Input records are decoded leniently: every field is optional and
//! scalar values of the wrong JSON type are read as text where that makes
//! sense. The report schema is versioned to allow future evolution.

use crate::aggregator::accumulator::SkipStats;
use crate::aggregator::metrics::{FlatRow, Metric, SeriesRow};
use crate::aggregator::{Granularity, WordSource};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One flat regulatory-text record (a title, part or section node)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRecord {
    /// Composite "<number>—<department>" label
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title_number: Option<String>,

    /// Structural kind ("section", "part", ...)
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    /// Free-text label whose tokens are counted as words
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Point in time the record refers to
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Precomputed description word count (from title flattening)
    #[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u64>,
}

/// Which counters a record contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Section,
    Part,
    Other,
}

impl RecordKind {
    /// Map a raw `type` value; anything unrecognized is `Other`
    pub fn from_type(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("section") => RecordKind::Section,
            Some("part") => RecordKind::Part,
            _ => RecordKind::Other,
        }
    }
}

impl RawRecord {
    pub fn record_kind(&self) -> RecordKind {
        RecordKind::from_type(self.kind.as_deref())
    }
}

/// Read any scalar JSON value as text; null becomes `None`
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }))
}

/// Read a non-negative count from a number or numeric string
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }))
}

/// Top-level report structure written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    /// Number of raw records fed to the engine
    pub record_count: usize,

    /// Parameters the views were computed with
    pub parameters: ReportParameters,

    /// Records left out of one or more views
    pub skipped: SkipStats,

    /// Flat totals per group, in key order
    pub groups: Vec<GroupSummary>,

    /// Requested metric views
    pub views: Vec<MetricView>,
}

/// Parameters echoed into a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportParameters {
    pub group_filter: String,

    pub word_source: WordSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_years: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_count: Option<usize>,
}

/// Flat totals for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: String,
    pub name: String,
    pub word_count: u64,
    pub section_count: u64,
    pub part_count: u64,
    pub avg_words_per_section: f64,
}

/// One metric view, flat or time-series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricView {
    Flat { metric: Metric, rows: Vec<FlatRow> },
    TimeSeries { metric: Metric, rows: Vec<SeriesRow> },
}

impl MetricView {
    pub fn metric(&self) -> Metric {
        match self {
            MetricView::Flat { metric, .. } | MetricView::TimeSeries { metric, .. } => *metric,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            MetricView::Flat { rows, .. } => rows.len(),
            MetricView::TimeSeries { rows, .. } => rows.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_lenient_fields() {
        let record: RawRecord = serde_json::from_value(json!({
            "title_number": 7,
            "type": "section",
            "label": null,
            "word_count": "12",
            "unexpected": true
        }))
        .unwrap();

        assert_eq!(record.title_number.as_deref(), Some("7"));
        assert_eq!(record.record_kind(), RecordKind::Section);
        assert!(record.label.is_none());
        assert_eq!(record.word_count, Some(12));
    }

    #[test]
    fn test_record_kind_from_type() {
        assert_eq!(RecordKind::from_type(Some("part")), RecordKind::Part);
        assert_eq!(RecordKind::from_type(Some("subpart")), RecordKind::Other);
        assert_eq!(RecordKind::from_type(None), RecordKind::Other);
    }

    #[test]
    fn test_raw_record_skips_absent_fields_on_write() {
        let record = RawRecord {
            title_number: Some("7".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({ "title_number": "7" }));
    }
}

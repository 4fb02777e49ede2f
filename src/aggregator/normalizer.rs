//! Record normalization.
//!
//! Turns a `RawRecord` into a `NormalizedRecord` with an explicit group key,
//! display name, kind, word count and timestamp, or reports why the record
//! cannot be attributed to any group.

use super::accumulator::{GroupKey, SkipStats};
use crate::parser::schema::{RawRecord, RecordKind};
use crate::utils::config::DEFAULT_DELIMITER;
use crate::utils::error::{EngineError, RecordSkip};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a record's word count comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum WordSource {
    /// Whitespace tokens of the record's `label`
    #[default]
    Label,

    /// The record's precomputed `word_count` field
    WordCount,
}

impl FromStr for WordSource {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "label" => Ok(WordSource::Label),
            "word_count" | "wordcount" => Ok(WordSource::WordCount),
            _ => Err(EngineError::InvalidWordSource(s.to_string())),
        }
    }
}

impl TryFrom<String> for WordSource {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for WordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordSource::Label => f.write_str("label"),
            WordSource::WordCount => f.write_str("word_count"),
        }
    }
}

/// Options shared by every record in one normalization pass
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizeOptions {
    pub delimiter: String,
    pub word_source: WordSource,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            word_source: WordSource::Label,
        }
    }
}

/// A record's position in time, if it has a usable one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordTime {
    Missing,
    Unparseable(String),
    At(DateTime<Utc>),
}

impl RecordTime {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordTime::At(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Why this record cannot be placed on a time axis, if it cannot
    pub fn skip_reason(&self) -> Option<RecordSkip> {
        match self {
            RecordTime::Missing => Some(RecordSkip::MissingTimestamp),
            RecordTime::Unparseable(raw) => Some(RecordSkip::UnparseableTimestamp(raw.clone())),
            RecordTime::At(_) => None,
        }
    }
}

/// A record attributed to a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub group_key: GroupKey,
    pub group_name: String,
    pub kind: RecordKind,
    pub word_count: u64,
    pub timestamp: RecordTime,
}

/// Normalized records of one run plus the entity skips
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub records: Vec<NormalizedRecord>,
    pub skipped: SkipStats,
}

/// Normalize a single record
///
/// **Public** - pure; no side effects
///
/// # Errors
/// * `RecordSkip::MissingEntity` - No `title_number`
/// * `RecordSkip::EmptyEntity` - `title_number` has an empty leading token
pub fn normalize_record(
    record: &RawRecord,
    options: &NormalizeOptions,
) -> Result<NormalizedRecord, RecordSkip> {
    let label = record.title_number.as_deref().ok_or(RecordSkip::MissingEntity)?;
    let (key, name) = split_entity_label(label, &options.delimiter).ok_or(RecordSkip::EmptyEntity)?;

    let word_count = match options.word_source {
        WordSource::Label => record
            .label
            .as_deref()
            .map(count_words)
            .unwrap_or(0),
        WordSource::WordCount => record.word_count.unwrap_or(0),
    };

    let timestamp = match record.date.as_deref() {
        None => RecordTime::Missing,
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => RecordTime::At(ts),
            None => RecordTime::Unparseable(raw.to_string()),
        },
    };

    Ok(NormalizedRecord {
        group_key: GroupKey::new(key),
        group_name: name.unwrap_or(key).to_string(),
        kind: record.record_kind(),
        word_count,
        timestamp,
    })
}

/// Normalize every record, counting the ones that belong to no group
pub fn normalize_records(records: &[RawRecord], options: &NormalizeOptions) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        records: Vec::with_capacity(records.len()),
        skipped: SkipStats::default(),
    };

    for (index, record) in records.iter().enumerate() {
        match normalize_record(record, options) {
            Ok(normalized) => batch.records.push(normalized),
            Err(reason) => {
                trace!("Skipping record {}: {}", index, reason);
                batch.skipped.missing_entity += 1;
            }
        }
    }

    if batch.skipped.missing_entity > 0 {
        debug!(
            "Skipped {} of {} records without a usable title number",
            batch.skipped.missing_entity,
            records.len()
        );
    }

    batch
}

/// Split `"<key><delimiter><name>"` into trimmed key and optional name
///
/// Returns `None` when the key is empty after trimming. A blank name is
/// reported as absent.
pub fn split_entity_label<'a>(label: &'a str, delimiter: &str) -> Option<(&'a str, Option<&'a str>)> {
    let (key, name) = match label.split_once(delimiter) {
        Some((key, name)) => (key.trim(), Some(name.trim())),
        None => (label.trim(), None),
    };

    if key.is_empty() {
        return None;
    }

    Some((key, name.filter(|n| !n.is_empty())))
}

/// Number of whitespace-separated tokens
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Parse a record date
///
/// Accepts RFC 3339, naive date-times (`T` or space separated, to the second
/// or the minute, with an optional `Z`) and the date-only forms `YYYY-MM-DD`,
/// `YYYY/MM/DD`, `MM-DD-YYYY` and `MM/DD/YYYY`. Naive values are UTC;
/// date-only values mean midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    // Minute precision, optionally with a trailing Z
    let naive_raw = raw.strip_suffix('Z').unwrap_or(raw);
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_raw, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m-%d-%Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

//! Time-bucketed aggregation.
//!
//! Every group seen in the input gets one accumulator per bucket, zero
//! when nothing landed there. Dated records go to the nearest bucket;
//! undated or unparseable ones are left out of this view only.

use super::accumulator::{GroupKey, MetricAccumulator, SkipStats};
use super::buckets::nearest_bucket;
use super::flat::{for_each_chunk, ChunkProgress};
use super::normalizer::{NormalizedRecord, RecordTime};
use crate::utils::error::EngineError;
use chrono::{DateTime, Utc};
use log::{debug, trace};
use std::collections::BTreeMap;

/// Per-group accumulators, index-aligned with `buckets`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeSeries {
    pub buckets: Vec<DateTime<Utc>>,
    pub groups: BTreeMap<GroupKey, Vec<MetricAccumulator>>,
}

impl TimeSeries {
    /// (bucket, accumulator) pairs for one group
    pub fn points<'a>(
        &'a self,
        key: &GroupKey,
    ) -> Option<impl Iterator<Item = (DateTime<Utc>, &'a MetricAccumulator)> + 'a> {
        self.groups
            .get(key)
            .map(|series| self.buckets.iter().copied().zip(series.iter()))
    }
}

/// Aggregate records into per-group, per-bucket accumulators
///
/// **Public** - main entry point for the time-series view
///
/// # Errors
/// * `EngineError::InvalidChunkSize` - `chunk_size` is zero
pub fn aggregate_time_series(
    records: &[NormalizedRecord],
    buckets: Vec<DateTime<Utc>>,
    chunk_size: usize,
) -> Result<(TimeSeries, SkipStats), EngineError> {
    aggregate_time_series_with(records, buckets, chunk_size, |_| {})
}

/// Aggregate into buckets, calling `on_chunk` after every slice
///
/// # Errors
/// * `EngineError::InvalidChunkSize` - `chunk_size` is zero
pub fn aggregate_time_series_with<F>(
    records: &[NormalizedRecord],
    buckets: Vec<DateTime<Utc>>,
    chunk_size: usize,
    mut on_chunk: F,
) -> Result<(TimeSeries, SkipStats), EngineError>
where
    F: FnMut(ChunkProgress),
{
    if chunk_size == 0 {
        return Err(EngineError::InvalidChunkSize);
    }

    debug!(
        "Bucketing {} records into {} buckets",
        records.len(),
        buckets.len()
    );

    let bucket_count = buckets.len();
    let mut groups: BTreeMap<GroupKey, Vec<MetricAccumulator>> = BTreeMap::new();
    let mut skipped = SkipStats::default();

    for_each_chunk(records, chunk_size, &mut on_chunk, |record| {
        let series = groups
            .entry(record.group_key.clone())
            .or_insert_with(|| vec![MetricAccumulator::default(); bucket_count]);

        let ts = match &record.timestamp {
            RecordTime::At(ts) => *ts,
            RecordTime::Missing => {
                skipped.missing_timestamp += 1;
                return;
            }
            RecordTime::Unparseable(raw) => {
                trace!("Unparseable date '{}' in group {}", raw, record.group_key);
                skipped.unparseable_timestamp += 1;
                return;
            }
        };

        match nearest_bucket(&buckets, ts) {
            Some(index) => series[index].record(record.kind, record.word_count),
            None => skipped.outside_buckets += 1,
        }
    });

    if skipped.total() > 0 {
        debug!(
            "Left out of time series: {} undated, {} unparseable dates, {} without buckets",
            skipped.missing_timestamp, skipped.unparseable_timestamp, skipped.outside_buckets
        );
    }

    Ok((TimeSeries { buckets, groups }, skipped))
}

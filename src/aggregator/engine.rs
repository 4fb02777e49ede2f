//! Run parameters, one-shot runs and the memoizing engine.
//!
//! A run normalizes raw records once, folds them into flat totals and, when
//! a timeline is requested, into per-bucket accumulators. Parameters are
//! checked before any record is touched.

use super::accumulator::SkipStats;
use super::buckets::{generate_buckets, Granularity, LookbackWindow};
use super::flat::{aggregate_flat_with, ChunkProgress, FlatAggregate};
use super::metrics::{select_flat, select_series, GroupFilter, Metric};
use super::normalizer::{normalize_records, NormalizeOptions, WordSource};
use super::timeseries::{aggregate_time_series_with, TimeSeries};
use crate::parser::schema::{
    AggregateReport, GroupSummary, MetricView, RawRecord, ReportParameters,
};
use crate::utils::config::{EngineConfig, MAX_LOOKBACK_YEARS, SCHEMA_VERSION};
use crate::utils::error::EngineError;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Time axis requested for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeline {
    pub granularity: Granularity,
    pub lookback_years: u32,

    /// End of the lookback window; always supplied by the caller
    pub now: DateTime<Utc>,
}

/// Everything that determines the output of a run besides the records
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunParams {
    pub delimiter: String,
    pub word_source: WordSource,
    pub chunk_size: usize,

    /// `None` computes the flat view only
    pub timeline: Option<Timeline>,
}

impl RunParams {
    /// Flat-only parameters taken from a config
    pub fn flat(config: &EngineConfig) -> Self {
        Self {
            delimiter: config.delimiter.clone(),
            word_source: config.word_source,
            chunk_size: config.chunk_size,
            timeline: None,
        }
    }

    /// Parameters for a flat plus time-series run, window ending at `now`
    pub fn time_series(config: &EngineConfig, now: DateTime<Utc>) -> Self {
        Self {
            timeline: Some(Timeline {
                granularity: config.granularity,
                lookback_years: config.lookback_years,
                now,
            }),
            ..Self::flat(config)
        }
    }

    /// Reject parameters no run could use
    ///
    /// # Errors
    /// * `EngineError::EmptyDelimiter` - Delimiter is empty
    /// * `EngineError::InvalidChunkSize` - Chunk size is zero
    /// * `EngineError::InvalidLookback` - Lookback above the supported maximum
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.delimiter.is_empty() {
            return Err(EngineError::EmptyDelimiter);
        }
        if self.chunk_size == 0 {
            return Err(EngineError::InvalidChunkSize);
        }
        if let Some(timeline) = &self.timeline {
            if timeline.lookback_years > MAX_LOOKBACK_YEARS {
                return Err(EngineError::InvalidLookback(timeline.lookback_years));
            }
        }
        Ok(())
    }

    fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            delimiter: self.delimiter.clone(),
            word_source: self.word_source,
        }
    }
}

impl Default for RunParams {
    fn default() -> Self {
        Self::flat(&EngineConfig::default())
    }
}

/// Time series plus the axis it was computed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketedSeries {
    pub granularity: Granularity,
    pub window: LookbackWindow,
    pub data: TimeSeries,
}

/// Output of one run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateResult {
    /// Raw records fed to the run, skipped ones included
    pub record_count: usize,

    pub groups: FlatAggregate,

    /// Present when the run had a timeline
    pub series: Option<BucketedSeries>,

    pub skipped: SkipStats,
}

/// Run the engine once
///
/// **Public** - main entry point for a single aggregation
///
/// # Errors
/// * `EngineError` - Parameters fail validation; nothing is computed
pub fn run(records: &[RawRecord], params: &RunParams) -> Result<AggregateResult, EngineError> {
    run_with(records, params, |_| {})
}

/// Run the engine once, reporting progress after every processed slice
///
/// The callback sees the flat pass first and then, with a timeline, the
/// time-series pass.
///
/// # Errors
/// * `EngineError` - Parameters fail validation; nothing is computed
pub fn run_with<F>(
    records: &[RawRecord],
    params: &RunParams,
    mut on_chunk: F,
) -> Result<AggregateResult, EngineError>
where
    F: FnMut(ChunkProgress),
{
    params.validate()?;

    let window = match &params.timeline {
        Some(timeline) => Some(LookbackWindow::ending_at(
            timeline.now,
            timeline.lookback_years,
        )?),
        None => None,
    };

    let batch = normalize_records(records, &params.normalize_options());
    let mut skipped = batch.skipped;

    let groups = aggregate_flat_with(&batch.records, params.chunk_size, &mut on_chunk)?;

    let series = match (&params.timeline, window) {
        (Some(timeline), Some(window)) => {
            let buckets = generate_buckets(timeline.granularity, &window);
            let (data, series_skips) = aggregate_time_series_with(
                &batch.records,
                buckets,
                params.chunk_size,
                &mut on_chunk,
            )?;
            skipped += series_skips;

            Some(BucketedSeries {
                granularity: timeline.granularity,
                window,
                data,
            })
        }
        _ => None,
    };

    debug!(
        "Run finished: {} records, {} groups, {} skips",
        records.len(),
        groups.len(),
        skipped.total()
    );

    Ok(AggregateResult {
        record_count: records.len(),
        groups,
        series,
        skipped,
    })
}

/// Hash of a record snapshot, used in the cache key
pub fn fingerprint(records: &[RawRecord]) -> u64 {
    let mut hasher = DefaultHasher::new();
    records.hash(&mut hasher);
    hasher.finish()
}

/// Snapshot hash, snapshot length and parameters
type CacheKey = (u64, usize, RunParams);

fn cache_key(records: &[RawRecord], params: &RunParams) -> CacheKey {
    (fingerprint(records), records.len(), params.clone())
}

/// Memoizing front end over [`run`]
///
/// Identical (snapshot, parameters) pairs return the same shared result.
/// The oldest entry is evicted once `capacity` is exceeded; a capacity of
/// zero disables caching.
#[derive(Debug)]
pub struct AggregationEngine {
    capacity: usize,
    entries: VecDeque<(CacheKey, Arc<AggregateResult>)>,
    hits: u64,
    misses: u64,
}

impl AggregationEngine {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    /// Aggregate `records`, reusing a cached result when one matches
    ///
    /// # Errors
    /// * `EngineError` - Parameters fail validation; nothing is cached
    pub fn aggregate(
        &mut self,
        records: &[RawRecord],
        params: &RunParams,
    ) -> Result<Arc<AggregateResult>, EngineError> {
        params.validate()?;

        let key = cache_key(records, params);

        if let Some((_, cached)) = self.entries.iter().find(|(k, _)| *k == key) {
            self.hits += 1;
            debug!("Cache hit for snapshot {:016x}", key.0);
            return Ok(Arc::clone(cached));
        }

        self.misses += 1;
        let result = Arc::new(run(records, params)?);

        if self.capacity > 0 {
            if self.entries.len() >= self.capacity {
                self.entries.pop_front();
            }
            self.entries.push_back((key, Arc::clone(&result)));
        }

        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Build a versioned report from a result
///
/// **Public** - one view per metric; time-series views when the result
/// carries a series, flat views otherwise
pub fn build_report(
    result: &AggregateResult,
    params: &RunParams,
    metrics: &[Metric],
    filter: &GroupFilter,
) -> AggregateReport {
    let views: Vec<MetricView> = metrics
        .iter()
        .map(|&metric| match &result.series {
            Some(_) => MetricView::TimeSeries {
                metric,
                rows: select_series(result, metric, filter),
            },
            None => MetricView::Flat {
                metric,
                rows: select_flat(result, metric, filter),
            },
        })
        .collect();

    let groups = result
        .groups
        .iter()
        .map(|(key, totals)| GroupSummary {
            key: key.to_string(),
            name: totals.name.clone(),
            word_count: totals.metrics.word_count,
            section_count: totals.metrics.section_count,
            part_count: totals.metrics.part_count,
            avg_words_per_section: totals.metrics.avg_words_per_section(),
        })
        .collect();

    let series = result.series.as_ref();

    info!(
        "Built report with {} groups and {} views",
        result.groups.len(),
        views.len()
    );

    AggregateReport {
        version: SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        record_count: result.record_count,
        parameters: ReportParameters {
            group_filter: filter.to_string(),
            word_source: params.word_source,
            granularity: series.map(|s| s.granularity),
            lookback_years: params.timeline.map(|t| t.lookback_years),
            window_start: series.map(|s| s.window.start.to_rfc3339()),
            window_end: series.map(|s| s.window.end.to_rfc3339()),
            bucket_count: series.map(|s| s.data.buckets.len()),
        },
        skipped: result.skipped,
        groups,
        views,
    }
}

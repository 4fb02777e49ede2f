//! Aggregation of regulatory records into group and time-bucket totals.
//!
//! This module transforms raw records into:
//! - Flat per-group totals (word, section and part counts)
//! - Per-group series over generated time buckets
//! - Calendar-year rollups
//! - Metric views selected from either of the above

pub mod accumulator;
pub mod buckets;
pub mod engine;
pub mod flat;
pub mod metrics;
pub mod normalizer;
pub mod rollup;
pub mod timeseries;

// Re-export main types and functions
pub use accumulator::{GroupKey, GroupTotals, MetricAccumulator, SkipStats};
pub use buckets::{generate_buckets, nearest_bucket, Granularity, LookbackWindow};
pub use engine::{
    build_report, run, run_with, AggregateResult, AggregationEngine, BucketedSeries, RunParams,
    Timeline,
};
pub use flat::{aggregate_flat, aggregate_flat_with, ChunkProgress, FlatAggregate};
pub use metrics::{
    select_flat, select_series, select_total, FlatRow, GroupFilter, Metric, SeriesPoint,
    SeriesRow,
};
pub use normalizer::{
    normalize_record, normalize_records, NormalizeOptions, NormalizedRecord, RecordTime,
    WordSource,
};
pub use rollup::{yearly_rollup, YearGroup, YearlyRollup};
pub use timeseries::{aggregate_time_series, aggregate_time_series_with, TimeSeries};

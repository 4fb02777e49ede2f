use crate::aggregator::Metric;
use crate::utils::config::{EngineConfig, ALL_GROUPS_LABEL};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Where records come from and how to read them
#[derive(Debug, Clone, Default)]
pub struct InputArgs {
    /// Path to the record (or title document) JSON file
    pub path: PathBuf,

    /// Input holds hierarchical title documents to flatten first
    pub titles: bool,
}

/// Arguments for the aggregate and timeseries commands
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AggregateArgs {
    pub input: InputArgs,

    /// Metrics to report, one view each
    pub metrics: Vec<Metric>,

    /// Group filter ("All", a title number or a full label)
    pub group: String,

    /// Output path for the JSON report (optional)
    pub output: Option<PathBuf>,

    /// Print terminal summary to stdout
    pub print_summary: bool,

    /// Engine settings after CLI overrides
    pub config: EngineConfig,
}

impl Default for AggregateArgs {
    fn default() -> Self {
        Self {
            input: InputArgs::default(),
            metrics: vec![Metric::WordCount],
            group: ALL_GROUPS_LABEL.to_string(),
            output: None,
            print_summary: false,
            config: EngineConfig::default(),
        }
    }
}

/// Arguments for the timeseries command
#[derive(Debug, Clone)]
pub struct TimeSeriesArgs {
    pub aggregate: AggregateArgs,

    /// End of the lookback window (None = current time)
    pub now: Option<DateTime<Utc>>,

    /// Non-empty buckets printed per row in the summary
    pub max_points: usize,
}

impl Default for TimeSeriesArgs {
    fn default() -> Self {
        Self {
            aggregate: AggregateArgs::default(),
            now: None,
            max_points: 24,
        }
    }
}

/// Arguments for the rollup command
#[derive(Debug, Clone, Default)]
pub struct RollupArgs {
    pub input: InputArgs,
    pub output: Option<PathBuf>,
    pub print_summary: bool,
    pub config: EngineConfig,
}

/// Arguments for the flatten command
#[derive(Debug, Clone, Default)]
pub struct FlattenArgs {
    /// Title document JSON file
    pub input: PathBuf,

    /// Flat record JSON file to write
    pub output: PathBuf,

    pub delimiter: String,
}

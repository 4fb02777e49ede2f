//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod aggregate;
pub mod flatten;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use aggregate::{execute_aggregate, execute_rollup, execute_timeseries, validate_args};
pub use flatten::execute_flatten;
pub use models::{AggregateArgs, FlattenArgs, InputArgs, RollupArgs, TimeSeriesArgs};
pub use utils::{display_schema, display_version, validate_report_file};

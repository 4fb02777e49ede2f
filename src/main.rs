//! eCFR Insight CLI
//!
//! Aggregates regulatory records into per-title word, section and part
//! statistics, flat or bucketed over time.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use ecfr_insight::aggregator::{Granularity, Metric, WordSource};
use ecfr_insight::commands::{
    display_schema, display_version, execute_aggregate, execute_flatten, execute_rollup,
    execute_timeseries, validate_args, validate_report_file, AggregateArgs, FlattenArgs, InputArgs,
    RollupArgs, TimeSeriesArgs,
};
use ecfr_insight::utils::config::{load_config, EngineConfig};

/// eCFR Insight - Regulatory text statistics by title and over time
#[derive(Parser, Debug)]
#[command(name = "ecfr-insight")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine settings file (TOML)
    #[arg(short, long, global = true, env = "ECFR_INSIGHT_CONFIG")]
    config: Option<PathBuf>,
}

/// Record input and engine overrides shared by the aggregation commands
#[derive(Args, Debug)]
struct InputOpts {
    /// Path to records JSON
    #[arg(short, long)]
    input: PathBuf,

    /// Input holds hierarchical title documents instead of flat records
    #[arg(long)]
    titles: bool,

    /// Separator between title number and department name
    #[arg(long)]
    delimiter: Option<String>,

    /// Word count source: label or word_count
    #[arg(long)]
    word_source: Option<WordSource>,

    /// Records processed between yield points
    #[arg(long)]
    chunk_size: Option<usize>,
}

/// View selection shared by aggregate and timeseries
#[derive(Args, Debug)]
struct ViewOpts {
    /// Metric to report (repeatable): wordCount, sectionCount, partCount, avgWordsPerSection
    #[arg(short, long = "metric", default_value = "wordCount")]
    metrics: Vec<Metric>,

    /// Group filter: "All", a title number, or a full title label
    #[arg(short, long, default_value = "All")]
    group: String,

    /// Output path for JSON report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print text summary to stdout
    #[arg(long)]
    summary: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Flat totals per title
    Aggregate {
        #[command(flatten)]
        input: InputOpts,

        #[command(flatten)]
        view: ViewOpts,
    },

    /// Totals per title per time bucket
    Timeseries {
        #[command(flatten)]
        input: InputOpts,

        #[command(flatten)]
        view: ViewOpts,

        /// Bucket step: daily, weekly, monthly, quarterly, annually
        #[arg(long)]
        granularity: Option<Granularity>,

        /// Years of history ending at --now
        #[arg(long)]
        lookback_years: Option<u32>,

        /// End of the window, RFC 3339 (defaults to the current time)
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Non-empty buckets printed per row in the summary
        #[arg(long, default_value = "24")]
        max_points: usize,
    },

    /// Calendar year/month totals per title
    Rollup {
        #[command(flatten)]
        input: InputOpts,

        /// Output path for rollup JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Flatten title documents into a flat record file
    Flatten {
        /// Path to title documents JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for flat records JSON
        #[arg(short, long)]
        output: PathBuf,

        /// Separator between title number and department name
        #[arg(long)]
        delimiter: Option<String>,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let base_config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    // Execute command
    match cli.command {
        Commands::Aggregate { input, view } => {
            let (input, config) = apply_input(input, base_config);
            let args = aggregate_args(input, view, config);

            validate_args(&args)?;
            execute_aggregate(args)?;
        }

        Commands::Timeseries {
            input,
            view,
            granularity,
            lookback_years,
            now,
            max_points,
        } => {
            let (input, mut config) = apply_input(input, base_config);
            if let Some(granularity) = granularity {
                config.granularity = granularity;
            }
            if let Some(years) = lookback_years {
                config.lookback_years = years;
            }

            let args = TimeSeriesArgs {
                aggregate: aggregate_args(input, view, config),
                now,
                max_points,
            };

            validate_args(&args.aggregate)?;
            execute_timeseries(args)?;
        }

        Commands::Rollup {
            input,
            output,
            summary,
        } => {
            let (input, config) = apply_input(input, base_config);

            if output.is_none() && !summary {
                anyhow::bail!("Nothing to do: pass --output and/or --summary");
            }

            execute_rollup(RollupArgs {
                input,
                output,
                print_summary: summary,
                config,
            })?;
        }

        Commands::Flatten {
            input,
            output,
            delimiter,
        } => {
            execute_flatten(FlattenArgs {
                input,
                output,
                delimiter: delimiter.unwrap_or(base_config.delimiter),
            })?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Apply CLI overrides on top of the loaded config
fn apply_input(opts: InputOpts, mut config: EngineConfig) -> (InputArgs, EngineConfig) {
    if let Some(delimiter) = opts.delimiter {
        config.delimiter = delimiter;
    }
    if let Some(word_source) = opts.word_source {
        config.word_source = word_source;
    }
    if let Some(chunk_size) = opts.chunk_size {
        config.chunk_size = chunk_size;
    }

    let input = InputArgs {
        path: opts.input,
        titles: opts.titles,
    };

    (input, config)
}

fn aggregate_args(input: InputArgs, view: ViewOpts, config: EngineConfig) -> AggregateArgs {
    AggregateArgs {
        input,
        metrics: view.metrics,
        group: view.group,
        output: view.output,
        print_summary: view.summary,
        config,
    }
}

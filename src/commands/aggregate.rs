//! Aggregate, timeseries and rollup command implementations.
//!
//! Each command:
//! 1. Loads records (flattening title documents if asked)
//! 2. Runs the engine once
//! 3. Selects one view per requested metric
//! 4. Writes the JSON report and/or prints a summary

use super::models::{AggregateArgs, InputArgs, RollupArgs, TimeSeriesArgs};
use crate::aggregator::{
    build_report, normalize_records, select_flat, select_series, select_total, yearly_rollup,
    AggregateResult, AggregationEngine, GroupFilter, NormalizeOptions, RunParams,
};
use crate::output::{
    render_flat_summary, render_series_summary, render_skip_summary, write_json, write_report,
};
use crate::parser::{flatten_titles, read_records, read_title_documents, RawRecord};
use anyhow::{Context, Result};
use chrono::Utc;
use colored::*;
use log::{debug, info};
use std::time::Instant;

/// Execute the aggregate (flat view) command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Input read or decode failures
/// * Invalid engine parameters
/// * File write errors
pub fn execute_aggregate(args: AggregateArgs) -> Result<()> {
    let start_time = Instant::now();
    info!("Starting flat aggregation of {}", args.input.path.display());

    info!("Step 1/3: Loading records...");
    let records = load_records(&args.input, &args.config.delimiter)?;

    info!("Step 2/3: Aggregating {} records...", records.len());
    let params = RunParams::flat(&args.config);
    let mut engine = AggregationEngine::from_config(&args.config);
    let result = engine
        .aggregate(&records, &params)
        .context("Failed to aggregate records")?;

    info!("Step 3/3: Writing outputs...");
    let filter = GroupFilter::parse(&args.group, &args.config.delimiter);
    emit(&result, &params, &args, &filter, 0)?;

    info!(
        "Aggregation completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Execute the timeseries command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Input read or decode failures
/// * Invalid engine parameters
/// * File write errors
pub fn execute_timeseries(args: TimeSeriesArgs) -> Result<()> {
    let start_time = Instant::now();
    let aggregate = &args.aggregate;
    let now = args.now.unwrap_or_else(Utc::now);

    info!(
        "Starting {} time series over {} years ending {}",
        aggregate.config.granularity, aggregate.config.lookback_years, now
    );

    info!("Step 1/3: Loading records...");
    let records = load_records(&aggregate.input, &aggregate.config.delimiter)?;

    info!("Step 2/3: Bucketing {} records...", records.len());
    let params = RunParams::time_series(&aggregate.config, now);
    let mut engine = AggregationEngine::from_config(&aggregate.config);
    let result = engine
        .aggregate(&records, &params)
        .context("Failed to aggregate records into time buckets")?;

    info!("Step 3/3: Writing outputs...");
    let filter = GroupFilter::parse(&aggregate.group, &aggregate.config.delimiter);
    emit(&result, &params, aggregate, &filter, args.max_points)?;

    info!(
        "Time series completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Execute the rollup command
///
/// **Public** - calendar year/month totals per group
pub fn execute_rollup(args: RollupArgs) -> Result<()> {
    args.config.validate().context("Invalid engine settings")?;

    info!("Step 1/3: Loading records...");
    let records = load_records(&args.input, &args.config.delimiter)?;

    info!("Step 2/3: Rolling up {} records...", records.len());
    let options = NormalizeOptions {
        delimiter: args.config.delimiter.clone(),
        word_source: args.config.word_source,
    };
    let batch = normalize_records(&records, &options);
    let mut rollup = yearly_rollup(&batch.records);
    rollup.skipped += batch.skipped;

    info!("Step 3/3: Writing outputs...");
    if let Some(path) = &args.output {
        write_json(&rollup, path).context("Failed to write rollup JSON")?;
        info!("✓ Rollup written to: {}", path.display());
    }

    if args.print_summary {
        println!("\n{}", "YEARLY ROLLUP".bold());
        for (year, groups) in &rollup.years {
            let words: u64 = groups.values().map(|g| g.total.word_count).sum();
            let sections: u64 = groups.values().map(|g| g.total.section_count).sum();
            println!(
                "  {}  {:>4} titles  {:>12} words  {:>8} sections",
                year.to_string().cyan(),
                groups.len(),
                words,
                sections
            );
        }
        println!("{}", render_skip_summary(&rollup.skipped));
    }

    Ok(())
}

/// Validate aggregate arguments
///
/// **Public** - can be called before execute_aggregate for early validation
pub fn validate_args(args: &AggregateArgs) -> Result<()> {
    if args.input.path.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if args.metrics.is_empty() {
        anyhow::bail!("At least one metric is required");
    }

    if args.output.is_none() && !args.print_summary {
        anyhow::bail!("Nothing to do: pass --output and/or --summary");
    }

    args.config
        .validate()
        .context("Invalid engine settings")?;

    Ok(())
}

/// Read records from disk, flattening title documents when asked
///
/// **Private** - shared by all aggregation commands
fn load_records(input: &InputArgs, delimiter: &str) -> Result<Vec<RawRecord>> {
    let records = if input.titles {
        let documents = read_title_documents(&input.path)
            .with_context(|| format!("Failed to read title documents from {}", input.path.display()))?;
        flatten_titles(&documents, delimiter)
    } else {
        read_records(&input.path)
            .with_context(|| format!("Failed to read records from {}", input.path.display()))?
    };

    debug!("Loaded {} records", records.len());

    Ok(records)
}

/// Write the report and print summaries for one result
///
/// **Private** - flat views when the result has no series
fn emit(
    result: &AggregateResult,
    params: &RunParams,
    args: &AggregateArgs,
    filter: &GroupFilter,
    max_points: usize,
) -> Result<()> {
    if let Some(path) = &args.output {
        let report = build_report(result, params, &args.metrics, filter);
        write_report(&report, path).context("Failed to write report JSON")?;
        println!("📊 Report written to {}", path.display().to_string().cyan());
    }

    if args.print_summary {
        for &metric in &args.metrics {
            match &result.series {
                Some(series) => {
                    let rows = select_series(result, metric, filter);
                    println!(
                        "\n{}",
                        render_series_summary(metric, series.granularity, &rows, max_points)
                    );
                }
                None => {
                    let rows = select_flat(result, metric, filter);
                    let total = match filter {
                        GroupFilter::All => Some(select_total(result, metric)),
                        GroupFilter::Group(_) => None,
                    };
                    println!("\n{}", render_flat_summary(metric, &rows, total.as_ref()));
                }
            }
        }
        println!("\n{}", render_skip_summary(&result.skipped));
    }

    Ok(())
}

use crate::output::read_report;
use crate::parser::MetricView;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    if report.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported report version {} (expected {})",
            report.version,
            SCHEMA_VERSION
        );
    }

    println!("{}", "✓ Valid report JSON".green());
    println!("  Version: {}", report.version);
    println!("  Generated: {}", report.generated_at);
    println!("  Records: {}", report.record_count);
    println!("  Groups: {}", report.groups.len());
    println!("  Skipped: {}", report.skipped.total());
    for view in &report.views {
        let kind = match view {
            MetricView::Flat { .. } => "flat",
            MetricView::TimeSeries { .. } => "time series",
        };
        println!("  View: {} ({}, {} rows)", view.metric(), kind, view.row_count());
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("eCFR Insight Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string       - ISO 8601 timestamp");
        println!("  record_count: number       - Raw records fed to the engine");
        println!("  parameters: object         - Run parameters");
        println!("    group_filter: string     - 'All' or a title number");
        println!("    word_source: string      - 'label' or 'word_count'");
        println!("    granularity: string?     - Bucket step (time series only)");
        println!("    lookback_years: number?  - Window length (time series only)");
        println!("    window_start/end: string? - Window bounds, RFC 3339");
        println!("    bucket_count: number?    - Generated buckets");
        println!("  skipped: object            - Records left out, by reason");
        println!("  groups: array              - Flat totals per title");
        println!("    key, name: string        - Title number and department");
        println!("    word_count, section_count, part_count: number");
        println!("    avg_words_per_section: number");
        println!("  views: array               - One per requested metric");
        println!("    kind: string             - 'flat' or 'time_series'");
        println!("    metric: string           - wordCount, sectionCount, partCount, avgWordsPerSection");
        println!("    rows: array              - {{key, label, value}} or {{key, label, points}}");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("eCFR Insight v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Word, section and part statistics for regulatory titles, by title and over time.");
}

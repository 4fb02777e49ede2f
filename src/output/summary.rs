//! Terminal summaries for flat and time-series views.

use crate::aggregator::{FlatRow, Granularity, Metric, SeriesRow, SkipStats};
use colored::*;

const LABEL_WIDTH: usize = 42;
const VALUE_WIDTH: usize = 14;
const BAR_WIDTH: usize = 30;

/// Render a flat view as a box table with proportional bars
///
/// `total` is printed as a closing row when given.
pub fn render_flat_summary(metric: Metric, rows: &[FlatRow], total: Option<&FlatRow>) -> String {
    let mut lines = Vec::new();

    lines.push(format!("  📊 {}", metric.description().bold()));
    lines.push(border('┏', '┳', '┓'));
    lines.push(format!(
        "  ┃ {:<w$} ┃ {:^v$} ┃ {:<b$} ┃",
        "Title",
        metric.as_str(),
        "",
        w = LABEL_WIDTH,
        v = VALUE_WIDTH,
        b = BAR_WIDTH
    ));
    lines.push(border('┣', '╋', '┫'));

    let max = rows.iter().map(|row| row.value).fold(0.0_f64, f64::max);

    for row in rows {
        lines.push(format!(
            "  ┃ {:<w$} ┃ {:>v$} ┃ {:<b$} ┃",
            truncate(&format!("{} {}", row.key, row.label)),
            format_value(metric, row.value),
            bar(row.value, max).cyan(),
            w = LABEL_WIDTH,
            v = VALUE_WIDTH,
            b = BAR_WIDTH
        ));
    }

    if let Some(total) = total {
        lines.push(border('┣', '╋', '┫'));
        lines.push(format!(
            "  ┃ {:<w$} ┃ {:>v$} ┃ {:<b$} ┃",
            total.label.bold(),
            format_value(metric, total.value).bold(),
            "",
            w = LABEL_WIDTH,
            v = VALUE_WIDTH,
            b = BAR_WIDTH
        ));
    }

    lines.push(border('┗', '┻', '┛'));

    if rows.is_empty() {
        lines.push("   (no matching groups)".yellow().to_string());
    }

    lines.join("\n")
}

/// Render a time-series view: one block per row, one line per bucket
///
/// Empty buckets are elided after the first; `max_points` caps the lines
/// printed per row.
pub fn render_series_summary(
    metric: Metric,
    granularity: Granularity,
    rows: &[SeriesRow],
    max_points: usize,
) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "  📈 {} ({})",
        metric.description().bold(),
        granularity
    ));

    if rows.is_empty() {
        lines.push("   (no matching groups)".yellow().to_string());
        return lines.join("\n");
    }

    for row in rows {
        let max = row.points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
        let non_empty: Vec<_> = row.points.iter().filter(|p| p.value > 0.0).collect();

        lines.push(String::new());
        lines.push(format!("  {} {}", row.key.bold(), row.label));

        for point in non_empty.iter().take(max_points) {
            lines.push(format!(
                "  └─ {:<12} {:>v$} {}",
                granularity.label(&point.bucket),
                format_value(metric, point.value),
                bar(point.value, max).cyan(),
                v = VALUE_WIDTH
            ));
        }

        if non_empty.len() > max_points {
            lines.push(format!(
                "   (Showing {} of {} non-empty buckets)",
                max_points,
                non_empty.len()
            ));
        }
        if non_empty.is_empty() {
            lines.push(format!("   (all {} buckets empty)", row.points.len()));
        }
    }

    lines.join("\n")
}

/// One-line account of what was left out
pub fn render_skip_summary(skipped: &SkipStats) -> String {
    if skipped.total() == 0 {
        return format!("{}", "✓ No records skipped".green());
    }

    format!(
        "{} {} without title number, {} undated, {} unparseable dates, {} without buckets",
        "⚠️  Skipped:".yellow().bold(),
        skipped.missing_entity,
        skipped.missing_timestamp,
        skipped.unparseable_timestamp,
        skipped.outside_buckets
    )
}

fn border(left: char, mid: char, right: char) -> String {
    format!(
        "  {}{}{}{}{}{}{}",
        left,
        "━".repeat(LABEL_WIDTH + 2),
        mid,
        "━".repeat(VALUE_WIDTH + 2),
        mid,
        "━".repeat(BAR_WIDTH + 2),
        right
    )
}

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let width = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(width.clamp(1, BAR_WIDTH))
}

fn format_value(metric: Metric, value: f64) -> String {
    if metric.is_additive() {
        format!("{}", value as u64)
    } else {
        format!("{:.2}", value)
    }
}

fn truncate(label: &str) -> String {
    if label.chars().count() > LABEL_WIDTH {
        let kept: String = label.chars().take(LABEL_WIDTH - 3).collect();
        format!("{}...", kept)
    } else {
        label.to_string()
    }
}

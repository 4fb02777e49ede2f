//! Output writers for reports and terminal summaries.
//!
//! This module handles:
//! - JSON reports, rollups and record dumps
//! - Box-table summaries for the terminal

pub mod json;
pub mod summary;

// Re-export main functions
pub use json::{read_report, write_json, write_report};
pub use summary::{render_flat_summary, render_series_summary, render_skip_summary};

//! eCFR Insight
//!
//! Aggregation engine for regulatory-text records: word, section and
//! part counts grouped by title, collapsed or bucketed over time.
//!
//! This crate provides the core implementation for the
//! `ecfr-insight` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! ecfr-insight aggregate --input records.json --metric wordCount --summary
//! ecfr-insight timeseries --input records.json --granularity annually --summary
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;

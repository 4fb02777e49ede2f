//! Record input and report schema.
//!
//! This module handles:
//! - Decoding flat record dumps
//! - Flattening hierarchical title documents
//! - Defining input and output schema

pub mod records;
pub mod schema;
pub mod titles;

// Re-export main types
pub use records::{parse_records, read_records};
pub use schema::{AggregateReport, GroupSummary, MetricView, RawRecord, RecordKind, ReportParameters};
pub use titles::{flatten_titles, parse_title_label, read_title_documents, TitleNode};

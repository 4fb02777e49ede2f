//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while decoding record input
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid record format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Caller contract violations on engine parameters.
///
/// Raised before any aggregation work starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown granularity '{0}' (expected daily, weekly, monthly, quarterly or annually)")]
    InvalidGranularity(String),

    #[error("Unknown metric '{0}' (expected wordCount, sectionCount, partCount or avgWordsPerSection)")]
    InvalidMetric(String),

    #[error("Unknown word source '{0}' (expected label or word_count)")]
    InvalidWordSource(String),

    #[error("Group delimiter cannot be empty")]
    EmptyDelimiter,

    #[error("Chunk size must be greater than 0")]
    InvalidChunkSize,

    #[error("Lookback of {0} years is out of range")]
    InvalidLookback(u32),
}

/// Reasons a single record is left out of a view.
///
/// These never abort a run; they are counted and logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordSkip {
    #[error("record has no title_number")]
    MissingEntity,

    #[error("record title_number has no usable identifier")]
    EmptyEntity,

    #[error("record has no date")]
    MissingTimestamp,

    #[error("record date '{0}' could not be parsed")]
    UnparseableTimestamp(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while loading an engine configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] EngineError),
}

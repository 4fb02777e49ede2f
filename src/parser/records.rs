//! Record input decoding.
//!
//! Accepts the flat record dump produced by the title preprocessing step,
//! either as a bare JSON array or wrapped in an object. Individual records
//! that fail to decode are logged and dropped; the run continues.

use super::schema::RawRecord;
use crate::utils::config::RECORD_FIELD_NAMES;
use crate::utils::error::ParseError;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read and decode a record file
///
/// **Public** - main entry point for loading engine input
///
/// # Errors
/// * `ParseError::IoError` - File cannot be opened
/// * `ParseError::JsonError` - File is not valid JSON
/// * `ParseError::InvalidFormat` - No record array could be located
pub fn read_records(input_path: impl AsRef<Path>) -> Result<Vec<RawRecord>, ParseError> {
    let input_path = input_path.as_ref();

    info!("Reading records from: {}", input_path.display());

    let file = File::open(input_path)?;
    let raw: Value = serde_json::from_reader(BufReader::new(file))?;

    parse_records(&raw)
}

/// Decode records from an already-parsed JSON document
///
/// # Errors
/// * `ParseError::InvalidFormat` - Document holds no record array, or every
///   element failed to decode
pub fn parse_records(raw: &Value) -> Result<Vec<RawRecord>, ParseError> {
    let elements = locate_record_array(raw)?;
    let records = parse_records_array(elements)?;

    debug!("Decoded {} of {} records", records.len(), elements.len());

    Ok(records)
}

/// Find the record array in a bare array or a wrapping object
///
/// **Private** - internal helper for parse_records
fn locate_record_array(raw: &Value) -> Result<&Vec<Value>, ParseError> {
    match raw {
        Value::Array(elements) => Ok(elements),

        Value::Object(obj) => RECORD_FIELD_NAMES
            .iter()
            .find_map(|field| obj.get(*field).and_then(Value::as_array))
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Object input must hold a record array under one of: {}",
                    RECORD_FIELD_NAMES.join(", ")
                ))
            }),

        _ => Err(ParseError::InvalidFormat(
            "Records must be a JSON array or object".to_string(),
        )),
    }
}

/// Parse array of records
///
/// **Private** - internal parsing logic
fn parse_records_array(elements: &[Value]) -> Result<Vec<RawRecord>, ParseError> {
    let mut records = Vec::with_capacity(elements.len());

    for (index, element) in elements.iter().enumerate() {
        match RawRecord::deserialize(element) {
            Ok(record) => records.push(record),
            Err(e) => {
                // Log but don't fail - some records may be malformed
                warn!("Failed to parse record {}: {}", index, e);
            }
        }
    }

    if records.is_empty() && !elements.is_empty() {
        return Err(ParseError::InvalidFormat(
            "All records failed to parse".to_string(),
        ));
    }

    Ok(records)
}

//! Flatten hierarchical title documents into flat records.
//!
//! A title document is a tree: the root carries a label such as
//! `"Title 7 - Agriculture"` and nested `children` for chapters, parts and
//! sections. Every descendant becomes one `RawRecord` tagged with the
//! composite title label, in pre-order.

use super::schema::RawRecord;
use crate::utils::error::ParseError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One node of a title document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleNode {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub children: Vec<TitleNode>,
}

/// Read a file holding one title document or an array of them
///
/// # Errors
/// * `ParseError::IoError` - File cannot be opened
/// * `ParseError::JsonError` - Content is not a title document (array)
pub fn read_title_documents(input_path: impl AsRef<Path>) -> Result<Vec<TitleNode>, ParseError> {
    let input_path = input_path.as_ref();

    info!("Reading title documents from: {}", input_path.display());

    let file = File::open(input_path)?;
    let raw: Value = serde_json::from_reader(BufReader::new(file))?;

    let documents = match raw {
        Value::Array(_) => serde_json::from_value::<Vec<TitleNode>>(raw)?,
        Value::Object(_) => vec![serde_json::from_value::<TitleNode>(raw)?],
        _ => {
            return Err(ParseError::InvalidFormat(
                "Title input must be a JSON object or array".to_string(),
            ))
        }
    };

    debug!("Loaded {} title documents", documents.len());

    Ok(documents)
}

/// Flatten title documents into records
///
/// **Public** - main entry point for flattening
///
/// Titles whose label does not carry a number still emit their nodes, with
/// no `title_number`; the engine skips those later.
pub fn flatten_titles(documents: &[TitleNode], delimiter: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();

    for document in documents {
        let title_number = document
            .label
            .as_deref()
            .and_then(parse_title_label)
            .map(|(number, name)| match name {
                Some(name) => format!("{}{}{}", number, delimiter, name),
                None => number,
            });

        if title_number.is_none() {
            warn!(
                "Title document without a number: {:?}",
                document.label.as_deref().unwrap_or("<no label>")
            );
        }

        for child in &document.children {
            flatten_node(child, title_number.as_deref(), &mut records);
        }
    }

    info!(
        "Flattened {} title documents into {} records",
        documents.len(),
        records.len()
    );

    records
}

/// Emit `node` and its descendants in pre-order
///
/// **Private** - recursive helper for flatten_titles
fn flatten_node(node: &TitleNode, title_number: Option<&str>, out: &mut Vec<RawRecord>) {
    let word_count = node
        .description
        .as_deref()
        .map(|d| d.split_whitespace().count() as u64)
        .unwrap_or(0);

    out.push(RawRecord {
        title_number: title_number.map(str::to_string),
        kind: node.kind.clone(),
        label: node.label.clone(),
        date: node.date.clone(),
        identifier: node.identifier.clone(),
        description: node.description.clone(),
        word_count: Some(word_count),
    });

    for child in &node.children {
        flatten_node(child, title_number, out);
    }
}

/// Split a title label into its number and optional name
///
/// `"Title 7 - Agriculture"` gives `("7", Some("Agriculture"))`,
/// `"Title 7"` gives `("7", None)`. Labels not starting with the word
/// "title" give `None`.
pub fn parse_title_label(label: &str) -> Option<(String, Option<String>)> {
    let mut words = label.split_whitespace();

    let first = words.next()?;
    if !first.eq_ignore_ascii_case("title") {
        return None;
    }

    let number = words.next()?.trim_end_matches([':', '.', ',']);
    if number.is_empty() {
        return None;
    }

    let rest: Vec<&str> = words.collect();
    let name = rest
        .join(" ")
        .trim_start_matches(|c: char| c == '-' || c == '\u{2014}' || c == ':' || c.is_whitespace())
        .trim()
        .to_string();

    Some((number.to_string(), (!name.is_empty()).then_some(name)))
}

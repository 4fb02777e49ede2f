//! Flatten command implementation.
//!
//! Turns downloaded title documents into the flat record dump the
//! aggregation commands read.

use super::models::FlattenArgs;
use crate::output::write_json;
use crate::parser::{flatten_titles, read_title_documents};
use anyhow::{Context, Result};
use log::info;

/// Execute the flatten command
///
/// **Public** - main entry point called from main.rs
pub fn execute_flatten(args: FlattenArgs) -> Result<()> {
    validate_flatten_args(&args)?;

    info!("Step 1/2: Reading title documents from {}...", args.input.display());
    let documents = read_title_documents(&args.input).context("Failed to read title documents")?;

    info!("Step 2/2: Flattening {} title documents...", documents.len());
    let records = flatten_titles(&documents, &args.delimiter);

    write_json(&records, &args.output).context("Failed to write flattened records")?;
    info!(
        "✓ {} records written to: {}",
        records.len(),
        args.output.display()
    );

    Ok(())
}

/// Validate flatten arguments
fn validate_flatten_args(args: &FlattenArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }
    if args.output.as_os_str().is_empty() {
        anyhow::bail!("Output path cannot be empty");
    }
    if args.input == args.output {
        anyhow::bail!("Refusing to overwrite the input file");
    }
    if args.delimiter.is_empty() {
        anyhow::bail!("Delimiter cannot be empty");
    }
    Ok(())
}

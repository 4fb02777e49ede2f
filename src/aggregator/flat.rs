//! Flat (time-collapsed) aggregation.
//!
//! Records are folded into one accumulator per group. Large inputs are
//! walked in fixed-size slices with a yield point between slices; the
//! slice size never changes the result.

use super::accumulator::{GroupKey, GroupTotals};
use super::normalizer::NormalizedRecord;
use crate::utils::error::EngineError;
use log::{debug, trace};
use std::collections::BTreeMap;

/// Group totals keyed by group, in key order
pub type FlatAggregate = BTreeMap<GroupKey, GroupTotals>;

/// Progress reported after each processed slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    /// Zero-based index of the slice just processed
    pub chunk_index: usize,

    /// Records processed so far
    pub processed: usize,

    /// Records in the whole input
    pub total: usize,
}

/// Aggregate records into per-group totals
///
/// **Public** - main entry point for the flat view
///
/// # Errors
/// * `EngineError::InvalidChunkSize` - `chunk_size` is zero
pub fn aggregate_flat(
    records: &[NormalizedRecord],
    chunk_size: usize,
) -> Result<FlatAggregate, EngineError> {
    aggregate_flat_with(records, chunk_size, |_| {})
}

/// Aggregate records, calling `on_chunk` after every slice
///
/// # Errors
/// * `EngineError::InvalidChunkSize` - `chunk_size` is zero
pub fn aggregate_flat_with<F>(
    records: &[NormalizedRecord],
    chunk_size: usize,
    mut on_chunk: F,
) -> Result<FlatAggregate, EngineError>
where
    F: FnMut(ChunkProgress),
{
    if chunk_size == 0 {
        return Err(EngineError::InvalidChunkSize);
    }

    debug!(
        "Aggregating {} records in slices of {}",
        records.len(),
        chunk_size
    );

    let mut groups = FlatAggregate::new();

    for_each_chunk(records, chunk_size, &mut on_chunk, |record| {
        let totals = groups
            .entry(record.group_key.clone())
            .or_insert_with(|| GroupTotals {
                name: record.group_name.clone(),
                metrics: Default::default(),
            });

        totals.metrics.record(record.kind, record.word_count);
    });

    debug!("Aggregated {} groups", groups.len());

    Ok(groups)
}

/// Walk `records` slice by slice, yielding between slices
///
/// Shared by the flat and time-series passes. `chunk_size` must be
/// non-zero.
pub(crate) fn for_each_chunk<F, V>(
    records: &[NormalizedRecord],
    chunk_size: usize,
    on_chunk: &mut F,
    mut visit: V,
) where
    F: FnMut(ChunkProgress),
    V: FnMut(&NormalizedRecord),
{
    let total = records.len();
    let mut processed = 0;

    for (chunk_index, chunk) in records.chunks(chunk_size).enumerate() {
        if chunk_index > 0 {
            std::thread::yield_now();
        }

        for record in chunk {
            visit(record);
        }

        processed += chunk.len();
        trace!("Processed slice {} ({}/{})", chunk_index, processed, total);

        on_chunk(ChunkProgress {
            chunk_index,
            processed,
            total,
        });
    }
}

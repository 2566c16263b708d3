//! Multi-length merge of previously aggregated outputs (§4.8).
//!
//! Each input prefix names a set of per-length tables written by a prior
//! counting run. For each requested length, every input's table for that
//! length is read, k-way merged (a binary heap over stream heads,
//! equivalent to repeatedly folding the two lowest-headed streams
//! together) summing counts on equal keys, and the resulting ascending
//! stream is fed through a single-length [`CountAggregator`] exactly as
//! the counting pipeline's own §4.6 stage would, so the abundance
//! threshold and output encoding stay in one place. An input missing a
//! requested length's table is a hard error: the merge has no maximal
//! stream to derive that length from, so silently treating it as empty
//! would understate true counts.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};

use crate::aggregator::CountAggregator;
use crate::error::{Operation, PipelineError};
use crate::output::{read_table, table_path, OutputRecord};

/// Merges several already-sorted record streams into one ascending,
/// key-coalesced stream. Missing/empty streams are the identity.
#[must_use]
pub fn merge_streams(streams: Vec<Vec<OutputRecord>>) -> Vec<OutputRecord> {
    let mut heap = BinaryHeap::new();
    let mut cursors = vec![0usize; streams.len()];
    for (i, stream) in streams.iter().enumerate() {
        if let Some(r) = stream.first() {
            heap.push(Reverse((r.kmer, i)));
        }
    }

    let mut merged = Vec::new();
    let mut current: Option<OutputRecord> = None;
    while let Some(Reverse((_, i))) = heap.pop() {
        let record = streams[i][cursors[i]];
        cursors[i] += 1;
        if let Some(next) = streams[i].get(cursors[i]) {
            heap.push(Reverse((next.kmer, i)));
        }

        current = Some(match current {
            Some(mut cur) if cur.kmer == record.kmer => {
                cur.count = cur.count.saturating_add(record.count);
                cur
            }
            Some(cur) => {
                merged.push(cur);
                record
            }
            None => record,
        });
    }
    if let Some(cur) = current {
        merged.push(cur);
    }
    merged
}

/// Merges per-length tables from `inputs` into `out_prefix`, one merged
/// table per requested length, dropping records below `min_abundance`.
///
/// # Errors
///
/// Returns an I/O error if any input or output table cannot be read or
/// written, or [`PipelineError::InputFormat`] if an input has no table
/// for a requested length.
pub fn run_merge(
    inputs: &[PathBuf],
    out_prefix: &Path,
    lengths: &[u32],
    min_abundance: u32,
) -> Result<(), PipelineError> {
    for &length in lengths {
        let mut streams = Vec::with_capacity(inputs.len());
        for input in inputs {
            let path = table_path(input, length);
            if !path.exists() {
                return Err(PipelineError::InputFormat {
                    operation: Operation::Merge,
                    details: format!(
                        "input '{}' has no table for length {length} ({} not found)",
                        input.display(),
                        path.display()
                    ),
                });
            }
            streams.push(read_table(&path)?);
        }

        let merged = merge_streams(streams);
        let mut aggregator = CountAggregator::new(out_prefix, &[length], min_abundance)?;
        for record in merged {
            let mut kmer = record.kmer;
            kmer.set_count(record.count);
            aggregator.ingest(kmer)?;
        }
        aggregator.finish()?;
    }
    Ok(())
}

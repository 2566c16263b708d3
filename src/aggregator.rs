//! Coalesces a single sorted k-mer stream into per-length count tables
//! (§4.6).
//!
//! A maximal-length k-mer, truncated to any shorter length, is still
//! ascending in sort order (truncation only clears low-order bits that a
//! length-L comparison never inspects). That lets one pass over one
//! globally sorted stream drive every requested output length at once,
//! instead of re-sorting per length.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::output::{table_path, OutputRecord, OutputStream};
use crate::packed_kmer::PackedKmer;
use crate::error::PipelineError;

struct LengthState {
    output: OutputStream,
    current: Option<PackedKmer>,
}

/// Consumes a strictly ascending stream of [`PackedKmer`] and writes, for
/// each requested length, the coalesced `(kmer, count)` records whose
/// count meets the abundance threshold.
pub struct CountAggregator {
    states: BTreeMap<u32, LengthState>,
    min_abundance: u32,
}

impl CountAggregator {
    /// Opens one output table per length under `out_prefix` (§6).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if any table cannot be created.
    pub fn new(out_prefix: &Path, lengths: &[u32], min_abundance: u32) -> Result<Self, PipelineError> {
        let mut states = BTreeMap::new();
        for &length in lengths {
            let path = table_path(out_prefix, length);
            states.insert(length, LengthState { output: OutputStream::create(&path)?, current: None });
        }
        Ok(Self { states, min_abundance })
    }

    /// Feeds one incoming k-mer, observed in globally ascending order, to
    /// every requested length at or below its own length.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a flush triggered by this call fails.
    pub fn ingest(&mut self, kmer: PackedKmer) -> Result<(), PipelineError> {
        let lengths: Vec<u32> = self.states.keys().copied().filter(|&l| l <= kmer.len()).collect();
        for length in lengths.into_iter().rev() {
            let mut truncated = kmer;
            truncated.truncate(length);
            truncated.set_count(kmer.count());

            let state = self.states.get_mut(&length).expect("length was just looked up");
            match state.current {
                Some(mut cur) if cur == truncated => {
                    let summed = cur.count().saturating_add(truncated.count());
                    cur.set_count(summed);
                    state.current = Some(cur);
                }
                Some(cur) => {
                    if cur.count() >= self.min_abundance {
                        state.output.push(OutputRecord { kmer: cur, count: cur.count() })?;
                    }
                    state.current = Some(truncated);
                }
                None => {
                    state.current = Some(truncated);
                }
            }
        }
        Ok(())
    }

    /// Flushes every length's current register (subject to the abundance
    /// threshold) and closes all output tables.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if any final flush fails.
    pub fn finish(self) -> Result<(), PipelineError> {
        for (_length, mut state) in self.states {
            if let Some(cur) = state.current {
                if cur.count() >= self.min_abundance {
                    state.output.push(OutputRecord { kmer: cur, count: cur.count() })?;
                }
            }
            state.output.finish()?;
        }
        Ok(())
    }

    /// Output table paths this aggregator is writing to, one per length.
    #[must_use]
    pub fn output_paths(out_prefix: &Path, lengths: &[u32]) -> Vec<PathBuf> {
        lengths.iter().map(|&l| table_path(out_prefix, l)).collect()
    }
}

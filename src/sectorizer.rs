//! Sampling-based partition planner (§4.3).
//!
//! Scans a bounded sample of k-mers from the input, estimates the total
//! population from the fraction of bytes the sample consumed, and splits
//! the 4096-value prefix space into sectors sized to fit one in-memory
//! sort batch each.

use std::io::Read;
use std::mem::size_of;

use crate::error::PipelineError;
use crate::format::SequenceFormat;
use crate::packed_kmer::PackedKmer;
use crate::scanner::{scan, ScanControl};

/// Number of distinct 12-bit prefix values.
pub const PREFIX_SPACE: u32 = 4096;

/// Default sample size: 2^23 k-mers, per §4.3.
pub const DEFAULT_SAMPLE_SIZE: usize = 1 << 23;

/// A contiguous half-open prefix interval `[lo, hi)` assigned to one
/// out-of-core partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    pub lo: u16,
    pub hi: u16,
}

impl Sector {
    #[must_use]
    pub fn contains(&self, prefix: u16) -> bool {
        prefix >= self.lo && prefix < self.hi
    }
}

/// The result of partition planning: a set of sectors covering the whole
/// prefix space, and the estimated total k-mer count used to derive them.
#[derive(Debug, Clone)]
pub struct PartitionPlan {
    pub sectors: Vec<Sector>,
    pub estimated_total: u64,
}

/// Samples `input`, then partitions the prefix space so that each sector
/// is expected to hold at most `memory_budget_bytes / size_of::<PackedKmer>()`
/// k-mers.
///
/// # Errors
///
/// Propagates scan I/O errors.
pub fn plan_partitions<R: Read>(
    input: R,
    min_len: u32,
    max_len: u32,
    format: SequenceFormat,
    memory_budget_bytes: u64,
    sample_size: usize,
) -> Result<PartitionPlan, PipelineError> {
    let mut prefixes: Vec<u16> = Vec::with_capacity(sample_size);
    let fraction = scan(input, min_len, max_len, format, |kmer| {
        prefixes.push(kmer.prefix());
        if prefixes.len() >= sample_size {
            ScanControl::Stop
        } else {
            ScanControl::Continue
        }
    })?;

    prefixes.sort_unstable();
    let sample_size = prefixes.len().max(1);
    let estimated_total = (sample_size as f64 / fraction.max(f64::EPSILON)).round() as u64;

    let per_sector_capacity = (memory_budget_bytes / size_of::<PackedKmer>() as u64).max(1);
    // Scale the sample threshold down to sample-space so we don't need the
    // (generally much larger) true population while walking the sample.
    let threshold = ((per_sector_capacity as f64 * sample_size as f64)
        / estimated_total.max(1) as f64)
        .max(1.0);

    let mut sectors = Vec::new();
    let mut lo: u16 = 0;
    let mut running: u64 = 0;
    let mut i = 0;
    while i < prefixes.len() {
        let prefix = prefixes[i];
        let mut j = i;
        while j < prefixes.len() && prefixes[j] == prefix {
            j += 1;
        }
        running += (j - i) as u64;
        i = j;

        let next_prefix = prefixes.get(i).copied().unwrap_or(PREFIX_SPACE as u16);
        if running as f64 >= threshold && next_prefix > prefix {
            sectors.push(Sector { lo, hi: prefix + 1 });
            lo = prefix + 1;
            running = 0;
        }
    }
    if (lo as u32) < PREFIX_SPACE {
        sectors.push(Sector { lo, hi: PREFIX_SPACE as u16 });
    }
    if sectors.is_empty() {
        sectors.push(Sector { lo: 0, hi: PREFIX_SPACE as u16 });
    }

    Ok(PartitionPlan { sectors, estimated_total })
}

//! Resolved, validated run configuration (§10.3).
//!
//! `Args` (clap) is the primary configuration source; `RunConfig`
//! centralizes the budgets and length range it resolves to, and performs
//! once-at-startup validation (`Lmin ≤ Lmax`, `maxdisk ≥ maxmem`, lengths
//! within the representable range) so the pipeline itself can assume a
//! well-formed configuration rather than re-checking at every stage.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::cli::Args;
use crate::error::{Operation, PipelineError};
use crate::packed_kmer::PackedKmer;
use crate::pipeline::PipelineConfig;
use crate::sectorizer::DEFAULT_SAMPLE_SIZE;

/// A fully resolved and validated run: an output prefix plus the
/// [`PipelineConfig`] the counting pipeline runs with.
pub struct RunConfig {
    pub out_prefix: PathBuf,
    pub pipeline: PipelineConfig,
}

impl RunConfig {
    /// Resolves and validates `args` into a [`RunConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidKmerLength`] if any requested length
    /// falls outside `1..=PackedKmer::MAX_LEN`, or
    /// [`PipelineError::Resource`] if `--maxdisk` is smaller than
    /// `--maxmem` (there would be no room to spill even one sector).
    pub fn from_args(args: &Args) -> Result<Self, PipelineError> {
        let lengths: Vec<u32> = args.lengths().into_iter().map(|l| l as u32).collect();
        let min_len = *lengths.iter().min().ok_or_else(|| PipelineError::InputFormat {
            operation: Operation::Scan,
            details: "no output lengths requested".to_string(),
        })?;
        let max_len = *lengths.iter().max().expect("non-empty: checked by min_len above");

        if min_len == 0 || max_len > PackedKmer::MAX_LEN {
            return Err(PipelineError::InvalidKmerLength {
                k: max_len as usize,
                min: 1,
                max: PackedKmer::MAX_LEN as u8,
            });
        }

        let memory_budget_bytes = args.maxmem * 1024 * 1024;
        let disk_budget_bytes = args.maxdisk * 1024 * 1024 * 1024;
        if disk_budget_bytes < memory_budget_bytes {
            return Err(PipelineError::Resource {
                operation: Operation::Spill,
                details: format!(
                    "--maxdisk ({} GB) must be at least --maxmem ({} MB): not enough room to spill a single sector",
                    args.maxdisk, args.maxmem
                ),
            });
        }

        let workers = args.cores.unwrap_or_else(default_worker_count);

        Ok(Self {
            out_prefix: args.output_prefix(),
            pipeline: PipelineConfig {
                lengths,
                min_len,
                max_len,
                format: args.resolved_input_format(),
                memory_budget_bytes,
                disk_budget_bytes,
                workers,
                min_abundance: args.min_abundance,
                canonical: args.canonical,
                sample_size: DEFAULT_SAMPLE_SIZE,
            },
        })
    }
}

/// Physical core count, falling back to 1 when it can't be determined.
fn default_worker_count() -> usize {
    std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

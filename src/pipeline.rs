//! Multi-pass scheduling under memory and disk budgets (§4.7).
//!
//! Sectors are spilled and sorted in batches ("passes") sized so that the
//! sum of active sectors' temp-file footprints never exceeds the disk
//! budget. Within a pass, sectors are sorted in parallel across a worker
//! pool; because sectors are always processed in ascending prefix order
//! and a parallel `map` over an ordered collection preserves that order,
//! the aggregator still observes one globally monotonic stream without a
//! separate reordering step.

use std::io::{Read, Seek, Write};
use std::path::Path;

use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::aggregator::CountAggregator;
use crate::error::{Operation, PipelineError};
use crate::format::SequenceFormat;
use crate::input::Input;
use crate::sectorizer::{plan_partitions, DEFAULT_SAMPLE_SIZE};
use crate::sort_stage::sort_sector;
use crate::spill::spill_pass;

/// The hard cap on sectors handled in a single pass (§4.7).
pub const MAX_SECTORS_PER_PASS: usize = 30;

/// Tunable parameters for one end-to-end counting run.
pub struct PipelineConfig {
    pub lengths: Vec<u32>,
    pub min_len: u32,
    pub max_len: u32,
    pub format: SequenceFormat,
    pub memory_budget_bytes: u64,
    pub disk_budget_bytes: u64,
    pub workers: usize,
    pub min_abundance: u32,
    pub canonical: bool,
    pub sample_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lengths: (8..=30).collect(),
            min_len: 8,
            max_len: 30,
            format: SequenceFormat::Auto,
            memory_budget_bytes: 2048 * 1024 * 1024,
            disk_budget_bytes: 10 * 1024 * 1024 * 1024,
            workers: 1,
            min_abundance: 3,
            canonical: false,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// Runs the full scan → sector → spill → sort → aggregate pipeline over
/// `input`, writing one output table per requested length under
/// `out_prefix`.
///
/// # Errors
///
/// Returns the first I/O, resource, or invariant error encountered at any
/// stage. Temporary files are best-effort cleaned up by their
/// [`tempfile::NamedTempFile`] guards regardless of outcome.
pub fn run(input: &Input, out_prefix: &Path, config: &PipelineConfig) -> Result<(), PipelineError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
        .map_err(|e| PipelineError::Resource {
            operation: Operation::Sort,
            details: e.to_string(),
        })?;

    let spooled = spool_if_stdin(input)?;
    let reopen = |path_or_stdin: &Input| -> Result<Box<dyn Read>, PipelineError> {
        match spooled.as_ref() {
            Some(tmp) => {
                let file = tmp.reopen().map_err(|e| PipelineError::io(Operation::Scan, e))?;
                Ok(Box::new(file))
            }
            None => match path_or_stdin {
                Input::File(path) => open_possibly_gzipped(path),
                Input::Stdin => unreachable!("stdin is always spooled"),
            },
        }
    };

    crate::log_info!(sample_size = config.sample_size, format = %config.format, "sampling input to plan sectors");
    let plan = plan_partitions(
        reopen(input)?,
        config.min_len,
        config.max_len,
        config.format,
        config.memory_budget_bytes / (config.workers as u64 + 2).max(1),
        config.sample_size,
    )?;
    crate::log_info!(sectors = plan.sectors.len(), estimated_total = plan.estimated_total, "partition plan ready");

    let sectors_per_pass = sectors_per_pass(plan.sectors.len(), config.disk_budget_bytes, config.memory_budget_bytes);
    let mut aggregator = CountAggregator::new(out_prefix, &config.lengths, config.min_abundance)?;

    for batch in plan.sectors.chunks(sectors_per_pass) {
        crate::log_info!(batch_size = batch.len(), "starting spill pass");
        let spilled = spill_pass(
            reopen(input)?,
            batch,
            config.min_len,
            config.max_len,
            config.format,
            config.canonical,
            spill_queue_bound(config.memory_budget_bytes, config.workers),
        )?;

        let sorted = pool.install(|| {
            spilled
                .into_par_iter()
                .map(sort_sector)
                .collect::<Result<Vec<_>, PipelineError>>()
        })?;

        for run in sorted {
            for kmer in run.kmers {
                aggregator.ingest(kmer)?;
            }
        }
    }

    aggregator.finish()
}

fn sectors_per_pass(sector_count: usize, disk_budget: u64, memory_budget: u64) -> usize {
    let disk_limited = (disk_budget / memory_budget.max(1)).max(1) as usize;
    sector_count.min(disk_limited).min(MAX_SECTORS_PER_PASS).max(1)
}

/// Rough per-record memory estimate used only to size the spill channel,
/// not the sector partition plan.
const SPILL_QUEUE_RECORD_ESTIMATE: u64 = 32;

fn spill_queue_bound(memory_budget: u64, workers: usize) -> usize {
    let per_worker = memory_budget / (workers as u64 + 2).max(1) / SPILL_QUEUE_RECORD_ESTIMATE;
    per_worker.clamp(64, 1 << 16) as usize
}

/// Opens `path`, transparently wrapping it in a [`flate2::read::GzDecoder`]
/// when its extension is `.gz` and the `gzip` feature is enabled.
#[cfg(feature = "gzip")]
fn open_possibly_gzipped(path: &Path) -> Result<Box<dyn Read>, PipelineError> {
    let gzipped = crate::format::is_gzip(path);
    let file = std::fs::File::open(path).map_err(|e| {
        if gzipped {
            PipelineError::Gzip { source: e, path: path.to_path_buf() }
        } else {
            PipelineError::io(Operation::Scan, e)
        }
    })?;
    if gzipped {
        Ok(Box::new(flate2::read::GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Opens `path` directly; gzip inputs are not supported without the `gzip`
/// feature and are scanned as raw (garbled) bytes, same as any other
/// unsupported input.
#[cfg(not(feature = "gzip"))]
fn open_possibly_gzipped(path: &Path) -> Result<Box<dyn Read>, PipelineError> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::io(Operation::Scan, e))?;
    Ok(Box::new(file))
}

/// If `input` is stdin, spools it entirely into a temp file so the
/// pipeline can reopen it for each pass; file inputs are reopened directly
/// since they're already seekable by path.
fn spool_if_stdin(input: &Input) -> Result<Option<NamedTempFile>, PipelineError> {
    match input {
        Input::File(_) => Ok(None),
        Input::Stdin => {
            let mut tmp = NamedTempFile::new().map_err(|e| PipelineError::io(Operation::Scan, e))?;
            std::io::copy(&mut std::io::stdin().lock(), &mut tmp)
                .map_err(|e| PipelineError::io(Operation::Scan, e))?;
            tmp.as_file_mut()
                .flush()
                .map_err(|e| PipelineError::io(Operation::Scan, e))?;
            tmp.as_file_mut()
                .rewind()
                .map_err(|e| PipelineError::io(Operation::Scan, e))?;
            Ok(Some(tmp))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{read_table, table_path};
    use std::io::Write as _;
    use tempfile::tempdir;

    #[test]
    fn end_to_end_small_input() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("genome.fa");
        std::fs::File::create(&fasta)
            .unwrap()
            .write_all(b">r1\nACGTACGTAC\n")
            .unwrap();

        let config = PipelineConfig {
            lengths: vec![4],
            min_len: 4,
            max_len: 4,
            format: SequenceFormat::Auto,
            memory_budget_bytes: 1 << 20,
            disk_budget_bytes: 1 << 30,
            workers: 1,
            min_abundance: 1,
            canonical: false,
            sample_size: 1 << 16,
        };
        let out_prefix = dir.path().join("out");
        run(&Input::File(fasta), &out_prefix, &config).unwrap();

        let records = read_table(&table_path(&out_prefix, 4)).unwrap();
        let total: u32 = records.iter().map(|r| r.count).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn forces_multiple_passes_with_tiny_disk_budget() {
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("genome.fa");
        let seq = "ACGTACGTACGTACGTACGTACGTACGTACGT".repeat(200);
        std::fs::File::create(&fasta)
            .unwrap()
            .write_all(format!(">r1\n{seq}\n").as_bytes())
            .unwrap();

        let config = PipelineConfig {
            lengths: vec![16],
            min_len: 16,
            max_len: 16,
            format: SequenceFormat::Auto,
            memory_budget_bytes: 256,
            disk_budget_bytes: 256,
            workers: 2,
            min_abundance: 1,
            canonical: false,
            sample_size: 1 << 12,
        };
        let out_prefix = dir.path().join("out");
        run(&Input::File(fasta), &out_prefix, &config).unwrap();
        let records = read_table(&table_path(&out_prefix, 16)).unwrap();
        assert!(!records.is_empty());
        for w in records.windows(2) {
            assert!(w[0].kmer < w[1].kmer);
        }
    }

    #[test]
    fn explicit_fasta_format_ignores_at_sign_inside_sequence() {
        // A FASTA record whose sequence line happens to contain '@'; under
        // an explicit Fasta format this must not be misread as a FASTQ
        // header, so the whole 10-base run should be countable.
        let dir = tempdir().unwrap();
        let fasta = dir.path().join("genome.fa");
        std::fs::File::create(&fasta)
            .unwrap()
            .write_all(b">r1\nACGT@ACGTAC\n")
            .unwrap();

        let config = PipelineConfig {
            lengths: vec![4],
            min_len: 4,
            max_len: 4,
            format: SequenceFormat::Fasta,
            memory_budget_bytes: 1 << 20,
            disk_budget_bytes: 1 << 30,
            workers: 1,
            min_abundance: 1,
            canonical: false,
            sample_size: 1 << 16,
        };
        let out_prefix = dir.path().join("out");
        run(&Input::File(fasta), &out_prefix, &config).unwrap();

        let records = read_table(&table_path(&out_prefix, 4)).unwrap();
        // '@' resets the run like any other invalid base, but is never
        // treated as a new header under an explicit Fasta format.
        let total: u32 = records.iter().map(|r| r.count).sum();
        assert_eq!(total, 1 + 7);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn reads_gzip_compressed_input_end_to_end() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempdir().unwrap();
        let gz_path = dir.path().join("genome.fa.gz");
        let mut encoder = GzEncoder::new(std::fs::File::create(&gz_path).unwrap(), Compression::default());
        encoder.write_all(b">r1\nACGTACGTAC\n").unwrap();
        encoder.finish().unwrap();

        let config = PipelineConfig {
            lengths: vec![4],
            min_len: 4,
            max_len: 4,
            format: SequenceFormat::Fasta,
            memory_budget_bytes: 1 << 20,
            disk_budget_bytes: 1 << 30,
            workers: 1,
            min_abundance: 1,
            canonical: false,
            sample_size: 1 << 16,
        };
        let out_prefix = dir.path().join("out");
        run(&Input::File(gz_path), &out_prefix, &config).unwrap();

        let records = read_table(&table_path(&out_prefix, 4)).unwrap();
        let total: u32 = records.iter().map(|r| r.count).sum();
        assert_eq!(total, 7);
    }
}

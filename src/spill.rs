//! Sector routing and disk spilling (§4.4).
//!
//! During one pass, the scanner (single producer) routes each packed k-mer
//! to its sector's bounded queue by prefix lookup; one writer thread per
//! active sector drains its queue into an append-only temporary file of
//! 16-byte Minimer records. A full queue blocks the scanner, which is the
//! pipeline's only backpressure mechanism (§5).

use std::io::{BufWriter, Write};
use std::io::Read;

use crossbeam::channel::{bounded, Sender};
use tempfile::NamedTempFile;

use crate::error::{Operation, PipelineError};
use crate::format::SequenceFormat;
use crate::packed_kmer::PackedKmer;
use crate::scanner::{scan, ScanControl};
use crate::sectorizer::Sector;

/// A sector that has finished receiving writes during the current pass,
/// ready for [`crate::sort_stage`] to read back.
pub struct SpilledSector {
    pub sector: Sector,
    pub file: NamedTempFile,
    pub record_count: u64,
}

/// Runs one spill pass: scans `input`, routes each k-mer whose prefix falls
/// in an active sector to that sector's writer, and returns the spilled
/// sectors once the scan and all writers have finished.
///
/// `queue_bound` is the per-sector channel capacity; `canonical` applies
/// the canonicalizing transform before routing.
///
/// # Errors
///
/// Returns the first I/O or resource error encountered by the scanner or
/// any writer thread.
pub fn spill_pass<R: Read>(
    input: R,
    active: &[Sector],
    min_len: u32,
    max_len: u32,
    format: SequenceFormat,
    canonical: bool,
    queue_bound: usize,
) -> Result<Vec<SpilledSector>, PipelineError> {
    // 4096-entry prefix -> sector-index lookup; None means "discard" (the
    // sector is not part of this pass).
    let mut lookup: Vec<Option<usize>> = vec![None; crate::sectorizer::PREFIX_SPACE as usize];
    for (idx, sector) in active.iter().enumerate() {
        for prefix in sector.lo..sector.hi {
            lookup[prefix as usize] = Some(idx);
        }
    }

    let mut senders: Vec<Sender<PackedKmer>> = Vec::with_capacity(active.len());
    let mut handles = Vec::with_capacity(active.len());
    for _ in active {
        let (tx, rx) = bounded::<PackedKmer>(queue_bound.max(1));
        senders.push(tx);
        let handle = std::thread::spawn(move || -> Result<(NamedTempFile, u64), PipelineError> {
            let tmp = NamedTempFile::new()
                .map_err(|e| PipelineError::io(Operation::Spill, e))?;
            let mut writer = BufWriter::new(tmp.reopen().map_err(|e| PipelineError::io(Operation::Spill, e))?);
            let mut count = 0u64;
            for kmer in rx {
                writer
                    .write_all(&kmer.to_minimer().to_bytes())
                    .map_err(|e| PipelineError::io(Operation::Spill, e))?;
                count += 1;
            }
            writer.flush().map_err(|e| PipelineError::io(Operation::Spill, e))?;
            Ok((tmp, count))
        });
        handles.push(handle);
    }

    let scan_result = scan(input, min_len, max_len, format, |mut kmer| {
        if canonical {
            kmer = kmer.canonical();
        }
        let prefix = kmer.prefix() as usize;
        if let Some(idx) = lookup[prefix] {
            // A full queue blocks here; this is the intended backpressure.
            if senders[idx].send(kmer).is_err() {
                return ScanControl::Stop;
            }
        }
        ScanControl::Continue
    });

    // Dropping the senders closes each writer's channel so it can finish.
    drop(senders);

    let mut spilled = Vec::with_capacity(active.len());
    for (sector, handle) in active.iter().zip(handles) {
        let (file, record_count) = handle
            .join()
            .map_err(|_| PipelineError::Invariant {
                operation: Operation::Spill,
                details: "writer thread panicked".to_string(),
            })??;
        spilled.push(SpilledSector { sector: *sector, file, record_count });
    }

    scan_result?;
    Ok(spilled)
}

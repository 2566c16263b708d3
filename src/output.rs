//! Per-length output tables (§3 `OutputStream`, §6 final output format).
//!
//! Each record is 24 bytes: a 16-byte Minimer, a little-endian 32-bit
//! count, and a little-endian 32-bit length tag. Records within one
//! length's table are written strictly ascending by key.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Operation, PipelineError};
use crate::packed_kmer::{Minimer, PackedKmer};

/// One emitted `(kmer, count)` record for a fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRecord {
    pub kmer: PackedKmer,
    pub count: u32,
}

impl OutputRecord {
    pub const ENCODED_LEN: usize = Minimer::ENCODED_LEN + 4 + 4;

    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..16].copy_from_slice(&self.kmer.to_minimer().to_bytes());
        out[16..20].copy_from_slice(&self.count.to_le_bytes());
        out[20..24].copy_from_slice(&self.kmer.len().to_le_bytes());
        out
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::ENCODED_LEN]) -> Self {
        let minimer_bytes: [u8; 16] = bytes[..16].try_into().unwrap();
        let count = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
        let mut kmer = PackedKmer::from_minimer(Minimer::from_bytes(minimer_bytes));
        kmer.set_count(count);
        Self { kmer, count }
    }
}

/// Returns the output path for length `length` given an output prefix, per
/// the `<out>.<L>` convention (§6).
#[must_use]
pub fn table_path(prefix: &Path, length: u32) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(format!(".{length}"));
    PathBuf::from(s)
}

/// A buffered, append-only sink for one length's output table.
pub struct OutputStream {
    writer: BufWriter<File>,
    buffer: Vec<OutputRecord>,
    high_water_mark: usize,
}

impl OutputStream {
    pub const DEFAULT_HIGH_WATER_MARK: usize = 4096;

    /// Creates (truncating) the output table at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self, PipelineError> {
        let file = File::create(path).map_err(|e| PipelineError::io(Operation::Aggregate, e))?;
        Ok(Self {
            writer: BufWriter::new(file),
            buffer: Vec::with_capacity(Self::DEFAULT_HIGH_WATER_MARK),
            high_water_mark: Self::DEFAULT_HIGH_WATER_MARK,
        })
    }

    /// Buffers `record`, flushing automatically once the high-water mark
    /// is reached.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a flush is triggered and fails.
    pub fn push(&mut self, record: OutputRecord) -> Result<(), PipelineError> {
        self.buffer.push(record);
        if self.buffer.len() >= self.high_water_mark {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes any buffered records to disk without closing the stream.
    ///
    /// # Errors
    ///
    /// Returns an I/O error on write failure.
    pub fn flush(&mut self) -> Result<(), PipelineError> {
        for record in self.buffer.drain(..) {
            self.writer
                .write_all(&record.to_bytes())
                .map_err(|e| PipelineError::io(Operation::Aggregate, e))?;
        }
        self.writer
            .flush()
            .map_err(|e| PipelineError::io(Operation::Aggregate, e))
    }

    /// Flushes remaining records and closes the underlying file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error on the final flush.
    pub fn finish(mut self) -> Result<(), PipelineError> {
        self.flush()
    }
}

/// Reads every record from a previously written output table, in file
/// (ascending key) order.
///
/// # Errors
///
/// Returns an I/O error if `path` cannot be read, or an invariant error if
/// its length is not a multiple of the record size.
pub fn read_table(path: &Path) -> Result<Vec<OutputRecord>, PipelineError> {
    let mut file = File::open(path).map_err(|e| PipelineError::io(Operation::Merge, e))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|e| PipelineError::io(Operation::Merge, e))?;
    if buf.len() % OutputRecord::ENCODED_LEN != 0 {
        return Err(PipelineError::Invariant {
            operation: Operation::Merge,
            details: format!("output table {} has truncated trailing record", path.display()),
        });
    }
    Ok(buf
        .chunks_exact(OutputRecord::ENCODED_LEN)
        .map(|chunk| OutputRecord::from_bytes(chunk.try_into().unwrap()))
        .collect())
}

//! Error types for the out-of-core k-mer counting pipeline.
//!
//! This module provides exhaustive, strongly-typed errors for every stage of
//! the pipeline, enabling precise error handling and informative messages.

use std::path::PathBuf;
use thiserror::Error;

/// The operation a [`PipelineError`] occurred during, carried alongside the
/// underlying cause so that user-visible failures name the stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Scan,
    Spill,
    Sort,
    Aggregate,
    Merge,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Scan => "scan",
            Self::Spill => "spill",
            Self::Sort => "sort",
            Self::Aggregate => "aggregate",
            Self::Merge => "merge",
        };
        write!(f, "{s}")
    }
}

/// Errors that can occur while running the counting pipeline.
///
/// Variants follow the taxonomy the pipeline is designed around: input
/// format errors, I/O errors, resource-budget errors, and programming-invariant
/// violations. The last class is modeled as an error rather than a panic so
/// that the driver's cleanup path still runs before the process exits.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or empty sequence input.
    #[error("malformed input during {operation}: {details}")]
    InputFormat { operation: Operation, details: String },

    /// Read/write/seek failure on input, temp, or output files.
    #[error("I/O failure during {operation} (sector {sector:?}, length {length:?}): {source}")]
    Io {
        operation: Operation,
        sector: Option<u16>,
        length: Option<usize>,
        #[source]
        source: std::io::Error,
    },

    /// A temp file could not be created, or the supplied budget cannot hold
    /// even a single sector.
    #[error("resource exhausted during {operation}: {details}")]
    Resource { operation: Operation, details: String },

    /// An internal invariant was violated: encoding desync, a comparator
    /// that disagreed with itself, a sector rank released out of order.
    #[error("invariant violated during {operation}: {details}")]
    Invariant { operation: Operation, details: String },

    /// K-mer length is outside the valid range (1-63).
    #[error("invalid k-mer length {k}: must be between {min} and {max}")]
    InvalidKmerLength { k: usize, min: u8, max: u8 },

    /// Encountered an invalid DNA base.
    #[error("invalid base '{base}' at position {position}")]
    InvalidBase { base: u8, position: usize },

    /// Failed to decompress gzip input.
    #[cfg(feature = "gzip")]
    #[error("failed to decompress gzip file '{path}': {source}")]
    Gzip {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

impl PipelineError {
    #[must_use]
    pub fn io(operation: Operation, source: std::io::Error) -> Self {
        Self::Io { operation, sector: None, length: None, source }
    }

    #[must_use]
    pub fn io_sector(operation: Operation, sector: u16, source: std::io::Error) -> Self {
        Self::Io { operation, sector: Some(sector), length: None, source }
    }

    #[must_use]
    pub fn io_length(operation: Operation, length: usize, source: std::io::Error) -> Self {
        Self::Io { operation, sector: None, length: Some(length), source }
    }
}

/// Error for invalid k-mer length, usable before a [`PipelineError`] context
/// (operation, path) is known.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("k-mer length {k} is out of range: must be between {min} and {max}")]
pub struct KmerLengthError {
    /// The invalid k value that was provided.
    pub k: usize,
    /// Minimum valid k-mer length.
    pub min: u8,
    /// Maximum valid k-mer length.
    pub max: u8,
}

/// Error for invalid DNA base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBaseError {
    /// The invalid byte value.
    pub base: u8,
    /// Position of the invalid byte in the sequence.
    pub position: usize,
}

impl std::fmt::Display for InvalidBaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.base.is_ascii_graphic() || self.base == b' ' {
            write!(
                f,
                "invalid base '{}' (0x{:02x}) at position {}",
                self.base as char, self.base, self.position
            )
        } else {
            write!(
                f,
                "invalid base 0x{:02x} at position {}",
                self.base, self.position
            )
        }
    }
}

impl std::error::Error for InvalidBaseError {}

impl From<KmerLengthError> for PipelineError {
    fn from(err: KmerLengthError) -> Self {
        PipelineError::InvalidKmerLength {
            k: err.k,
            min: err.min,
            max: err.max,
        }
    }
}

impl From<InvalidBaseError> for PipelineError {
    fn from(err: InvalidBaseError) -> Self {
        PipelineError::InvalidBase {
            base: err.base,
            position: err.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kmer_length_error_display() {
        let err = KmerLengthError { k: 80, min: 1, max: 63 };
        assert_eq!(
            err.to_string(),
            "k-mer length 80 is out of range: must be between 1 and 63"
        );
    }

    #[test]
    fn invalid_base_error_display() {
        let err = InvalidBaseError { base: b'N', position: 5 };
        assert_eq!(err.to_string(), "invalid base 'N' (0x4e) at position 5");
    }

    #[test]
    fn pipeline_error_from_kmer_length_error() {
        let err: PipelineError = KmerLengthError { k: 0, min: 1, max: 63 }.into();
        assert!(matches!(err, PipelineError::InvalidKmerLength { k: 0, .. }));
    }

    #[test]
    fn pipeline_error_from_invalid_base_error() {
        let err: PipelineError = InvalidBaseError { base: b'X', position: 3 }.into();
        assert!(matches!(
            err,
            PipelineError::InvalidBase { base: b'X', position: 3 }
        ));
    }

    #[test]
    fn operation_display() {
        assert_eq!(Operation::Spill.to_string(), "spill");
        assert_eq!(Operation::Aggregate.to_string(), "aggregate");
    }

    #[test]
    fn io_error_carries_sector() {
        let source = std::io::Error::other("disk full");
        let err = PipelineError::io_sector(Operation::Spill, 42, source);
        let msg = err.to_string();
        assert!(msg.contains("sector Some(42)"));
        assert!(msg.contains("spill"));
    }
}

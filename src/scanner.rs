//! Streaming sequence scanner (§4.2).
//!
//! Reads FASTA/FASTQ records line by line and emits maximal-length packed
//! k-mer windows, leaving per-length truncation to the aggregator (§4.6,
//! §9 Open Question: maximal-window-only emission).

use std::io::{BufRead, BufReader, Read};

use crate::error::{Operation, PipelineError};
use crate::format::SequenceFormat;
use crate::packed_kmer::{base_to_code, PackedKmer};

/// Whether the scan should continue after a callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// Scans `reader` for bases, invoking `callback` with each maximal-length
/// window (length `min(max_len, run_length_so_far)`) at every valid
/// position once the current run reaches at least `min_len` bases.
///
/// `format` controls which byte(s) are recognized as a record header:
/// `Fasta` only `>`, `Fastq` only `@`, `Auto` either (the byte-sniffing
/// behavior; callers resolve `Auto` against a file extension upstream when
/// an explicit `--format` override is wanted — see [`SequenceFormat`]).
/// Only `Fastq`/`Auto` treat `+` as a quality-block marker; `Fasta` never
/// does, since FASTA has no quality lines.
///
/// Returns the fraction of input bytes consumed (1.0 unless the callback
/// requested an early stop), used by the sectorizer to extrapolate the
/// total k-mer population from a sample.
///
/// # Errors
///
/// Propagates I/O errors from `reader`.
pub fn scan<R, F>(
    reader: R,
    min_len: u32,
    max_len: u32,
    format: SequenceFormat,
    mut callback: F,
) -> Result<f64, PipelineError>
where
    R: Read,
    F: FnMut(PackedKmer) -> ScanControl,
{
    let mut buffered = BufReader::new(reader);
    let mut window = PackedKmer::new();
    let mut run_len: u32 = 0;
    let mut seq_line_len: u64 = 0;
    let mut in_quality = false;
    let mut quality_remaining: u64 = 0;
    let mut total_bytes: u64 = 0;
    let mut consumed_bytes: u64 = 0;

    let mut line = Vec::new();
    loop {
        line.clear();
        let n = buffered
            .read_until(b'\n', &mut line)
            .map_err(|e| PipelineError::io(Operation::Scan, e))?;
        if n == 0 {
            break;
        }
        total_bytes += n as u64;
        consumed_bytes += n as u64;

        let trimmed = trim_newline(&line);
        if trimmed.is_empty() {
            continue;
        }

        // Quality content can contain any byte, including '>'/'@'/'+', so
        // this must be checked before any header/marker dispatch — a
        // quality line is never reinterpreted as a new record (§4.2).
        if in_quality {
            quality_remaining = quality_remaining.saturating_sub(trimmed.len() as u64);
            if quality_remaining == 0 {
                in_quality = false;
            }
            continue;
        }

        match trimmed[0] {
            b'>' | b'@' if is_header_byte(format, trimmed[0]) => {
                window = PackedKmer::new();
                run_len = 0;
                seq_line_len = 0;
                continue;
            }
            b'+' if format != SequenceFormat::Fasta => {
                quality_remaining = seq_line_len;
                in_quality = quality_remaining > 0;
                continue;
            }
            _ => {}
        }

        seq_line_len += trimmed.len() as u64;
        for &byte in trimmed {
            match base_to_code(byte) {
                Some(code) => {
                    window.push(code);
                    run_len += 1;
                    if run_len >= min_len {
                        let mut emitted = window;
                        let cap = emitted.len().min(max_len);
                        emitted.truncate(cap);
                        if callback(emitted) == ScanControl::Stop {
                            return Ok(consumed_bytes as f64 / total_bytes.max(1) as f64);
                        }
                    }
                }
                None => {
                    window = PackedKmer::new();
                    run_len = 0;
                }
            }
        }
    }

    Ok(1.0)
}

/// Whether `byte` should be treated as a record-header marker under
/// `format`: `>` only for FASTA, `@` only for FASTQ, either under `Auto`.
fn is_header_byte(format: SequenceFormat, byte: u8) -> bool {
    match format {
        SequenceFormat::Fasta => byte == b'>',
        SequenceFormat::Fastq => byte == b'@',
        SequenceFormat::Auto => byte == b'>' || byte == b'@',
    }
}

fn trim_newline(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str, min_len: u32, max_len: u32) -> Vec<Vec<u8>> {
        collect_as(input, min_len, max_len, SequenceFormat::Auto)
    }

    fn collect_as(input: &str, min_len: u32, max_len: u32, format: SequenceFormat) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        scan(input.as_bytes(), min_len, max_len, format, |k| {
            out.push(k.to_bases().to_vec());
            ScanControl::Continue
        })
        .unwrap();
        out
    }

    #[test]
    fn scenario_a_single_record_all_4mers() {
        let out = collect(">r1\nACGTACGTAC\n", 4, 4);
        assert_eq!(out.len(), 7);
        assert_eq!(out[0], b"ACGT");
        assert_eq!(out[6], b"GTAC");
    }

    #[test]
    fn scenario_b_two_records_homopolymer() {
        let out = collect(">r1\nAAAAA\n>r2\nAAAAA\n", 3, 3);
        // 3 windows per record of 5 bases
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|w| w == b"AAA"));
    }

    #[test]
    fn scenario_c_invalid_base_resets_run() {
        let out = collect(">r1\nACGTNACGT\n", 4, 4);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], b"ACGT");
        assert_eq!(out[1], b"ACGT");
    }

    #[test]
    fn fastq_quality_line_skipped() {
        let out = collect("@r1\nACGT\n+\nIIII\n", 4, 4);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], b"ACGT");
    }

    #[test]
    fn fastq_quality_line_starting_with_header_bytes_is_not_misread() {
        // The quality string ">>>>" / "@@@@" must stay quality content, not
        // be mistaken for a new record header or another '+' marker.
        let out = collect("@r1\nACGT\n+\n>>>>\n@r2\nACGT\n+\n@@@@\n", 4, 4);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|w| w == b"ACGT"));
    }

    #[test]
    fn fasta_format_ignores_at_sign_as_header() {
        // Under explicit Fasta format, '@' is just an invalid base byte,
        // never a record header.
        let out = collect_as(">r1\nACGT@ACGT\n", 4, 4, SequenceFormat::Fasta);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|w| w == b"ACGT"));
    }

    #[test]
    fn fastq_format_ignores_angle_bracket_as_header() {
        // Under explicit Fastq format, '>' inside quality text is never a
        // record header; only '@' starts a new record.
        let out = collect_as("@r1\nACGT\n+\n>>>>\n@r2\nACGT\n+\nIIII\n", 4, 4, SequenceFormat::Fastq);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn maximal_window_then_truncatable() {
        let mut out = Vec::new();
        scan("ACGTAC".as_bytes(), 2, 4, SequenceFormat::Auto, |k| {
            out.push(k);
            ScanControl::Continue
        })
        .unwrap();
        // first window reaches len 2, grows until capped at 4
        assert_eq!(out[0].len(), 2);
        assert_eq!(out.last().unwrap().len(), 4);
    }

    #[test]
    fn early_stop_returns_partial_fraction() {
        let mut count = 0;
        let frac = scan(
            ">r1\nACGTACGTACGTACGT\n".as_bytes(),
            4,
            4,
            SequenceFormat::Auto,
            |_| {
                count += 1;
                if count == 2 {
                    ScanControl::Stop
                } else {
                    ScanControl::Continue
                }
            },
        )
        .unwrap();
        assert!(frac > 0.0 && frac < 1.0);
    }

    #[test]
    fn lowercase_bases_accepted() {
        let out = collect(">r1\nacgtacgtac\n", 4, 4);
        assert_eq!(out.len(), 7);
    }
}

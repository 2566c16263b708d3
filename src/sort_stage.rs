//! Reads a spilled sector back into memory and sorts it (§4.5).
//!
//! The sort is a parallel partition-then-recurse quicksort: above
//! [`PARALLEL_RECURSION_THRESHOLD`] elements, partitioning fans out across
//! the worker pool via `rayon::join`; below that, the partition is handed
//! to the standard library's pattern-defeating sort as the serial base
//! case; below [`INSERTION_SORT_THRESHOLD`], a plain insertion sort is
//! cheaper than either. Order is stable on length among equal-bit keys,
//! which the Lomuto partition and insertion sort both preserve as ties
//! (`cmp_key` itself orders by length when bits are equal).

use std::cmp::Ordering;
use std::io::{BufReader, Read, Seek, SeekFrom};

use crate::error::{Operation, PipelineError};
use crate::packed_kmer::{Minimer, PackedKmer};
use crate::sectorizer::Sector;
use crate::spill::SpilledSector;

/// Below this many elements, a hand-rolled insertion sort beats both
/// quicksort's overhead and a library call.
const INSERTION_SORT_THRESHOLD: usize = 32;

/// Below this many elements, a partition no longer earns back the cost of
/// a `rayon::join` fan-out; fall back to the standard library's sort.
const PARALLEL_RECURSION_THRESHOLD: usize = 1 << 13;

/// An in-memory sorted sequence of k-mers corresponding to one fully
/// spilled sector, passed single-writer-single-reader to the aggregator.
pub struct SortedRun {
    pub sector: Sector,
    pub kmers: Vec<PackedKmer>,
}

/// Reopens `spilled`'s temp file, decodes its `record_count` Minimer
/// records, and sorts them by [`PackedKmer::cmp_key`].
///
/// Consumes `spilled`; its temp file is dropped (and removed) once the
/// sort completes.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or an invariant
/// violation if the file's length doesn't match its declared record
/// count.
pub fn sort_sector(spilled: SpilledSector) -> Result<SortedRun, PipelineError> {
    let SpilledSector { sector, file, record_count } = spilled;
    let mut reader = BufReader::new(file.reopen().map_err(|e| PipelineError::io(Operation::Sort, e))?);
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| PipelineError::io(Operation::Sort, e))?;

    let mut buf = vec![0u8; record_count as usize * Minimer::ENCODED_LEN];
    reader
        .read_exact(&mut buf)
        .map_err(|e| PipelineError::io(Operation::Sort, e))?;

    let mut kmers = Vec::with_capacity(record_count as usize);
    for chunk in buf.chunks_exact(Minimer::ENCODED_LEN) {
        let bytes: [u8; Minimer::ENCODED_LEN] = chunk.try_into().map_err(|_| {
            PipelineError::Invariant {
                operation: Operation::Sort,
                details: "spill record truncated".to_string(),
            }
        })?;
        kmers.push(PackedKmer::from_minimer(Minimer::from_bytes(bytes)));
    }

    // Spilled values carry no aggregated count yet; sort on key, with
    // length only as a tie-break per PackedKmer::cmp_key.
    quicksort(&mut kmers);

    Ok(SortedRun { sector, kmers })
}

/// Parallel partition-then-recurse quicksort over `slice`, switching to a
/// serial base case below [`PARALLEL_RECURSION_THRESHOLD`] and to
/// insertion sort below [`INSERTION_SORT_THRESHOLD`].
fn quicksort(slice: &mut [PackedKmer]) {
    if slice.len() <= INSERTION_SORT_THRESHOLD {
        insertion_sort(slice);
    } else if slice.len() <= PARALLEL_RECURSION_THRESHOLD {
        slice.sort_unstable_by(PackedKmer::cmp_key);
    } else {
        let pivot = partition(slice);
        let (left, rest) = slice.split_at_mut(pivot);
        let (_, right) = rest.split_first_mut().expect("pivot index is within bounds");
        rayon::join(|| quicksort(left), || quicksort(right));
    }
}

/// Lomuto partition on `cmp_key`, pivoting on the last element. Returns the
/// pivot's final index; `slice[..idx]` is `<= pivot` and `slice[idx+1..]`
/// is `> pivot`.
fn partition(slice: &mut [PackedKmer]) -> usize {
    let last = slice.len() - 1;
    let pivot = slice[last];
    let mut i = 0;
    for j in 0..last {
        if slice[j].cmp_key(&pivot) != Ordering::Greater {
            slice.swap(i, j);
            i += 1;
        }
    }
    slice.swap(i, last);
    i
}

fn insertion_sort(slice: &mut [PackedKmer]) {
    for i in 1..slice.len() {
        let mut j = i;
        while j > 0 && slice[j - 1].cmp_key(&slice[j]) == Ordering::Greater {
            slice.swap(j - 1, j);
            j -= 1;
        }
    }
}

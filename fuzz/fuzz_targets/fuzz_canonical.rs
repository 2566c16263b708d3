//! Fuzz target for `PackedKmer::canonical`.
//!
//! Tests that the canonical form has the expected properties:
//! 1. is idempotent
//! 2. a k-mer and its reverse complement share a canonical form
//! 3. the canonical form is never lexicographically greater than either

#![no_main]

use libfuzzer_sys::fuzz_target;
use sectormer::packed_kmer::PackedKmer;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > PackedKmer::MAX_LEN as usize {
        return;
    }

    for &byte in data {
        if !matches!(byte, b'A' | b'C' | b'G' | b'T') {
            return;
        }
    }

    let Ok(kmer) = PackedKmer::from_bases(data) else {
        return;
    };

    let canonical = kmer.canonical();

    let canonical2 = canonical.canonical();
    assert_eq!(canonical, canonical2, "canonical is not idempotent");

    let rc = kmer.reverse_complement();
    let rc_canonical = rc.canonical();
    assert_eq!(canonical, rc_canonical, "k-mer and its reverse complement disagree on canonical form");

    assert!(canonical.to_bases() <= kmer.to_bases(), "canonical form is greater than the original");
    assert!(canonical.to_bases() <= rc.to_bases(), "canonical form is greater than the reverse complement");
});

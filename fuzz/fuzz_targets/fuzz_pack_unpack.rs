//! Fuzz target for the `PackedKmer` -> `Minimer` -> `PackedKmer` roundtrip.
//!
//! Tests that packing a valid DNA sequence, converting to a `Minimer`, and
//! converting back is the identity operation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sectormer::packed_kmer::PackedKmer;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > PackedKmer::MAX_LEN as usize {
        return;
    }

    for &byte in data {
        if !matches!(byte, b'A' | b'C' | b'G' | b'T' | b'a' | b'c' | b'g' | b't') {
            return;
        }
    }

    let Ok(kmer) = PackedKmer::from_bases(data) else {
        return;
    };

    let minimer = kmer.to_minimer();
    let back = PackedKmer::from_minimer(minimer);

    assert_eq!(back.len(), kmer.len(), "length mismatch after minimer roundtrip");
    assert_eq!(back.to_bases(), kmer.to_bases(), "bases mismatch after minimer roundtrip");

    let bytes = minimer.to_bytes();
    assert_eq!(
        sectormer::packed_kmer::Minimer::from_bytes(bytes),
        minimer,
        "minimer byte-serialization roundtrip failed"
    );
});

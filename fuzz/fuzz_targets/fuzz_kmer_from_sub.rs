//! Fuzz target for `PackedKmer::from_bases`.
//!
//! Tests that arbitrary byte input is handled gracefully: `from_bases`
//! either accepts a valid DNA sequence or reports the offending byte, and
//! never panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sectormer::packed_kmer::PackedKmer;

fuzz_target!(|data: &[u8]| {
    if data.len() > PackedKmer::MAX_LEN as usize {
        return;
    }

    match PackedKmer::from_bases(data) {
        Ok(kmer) => {
            assert_eq!(kmer.len() as usize, data.len(), "length not preserved on accept");
            let normalized: Vec<u8> = data.iter().map(u8::to_ascii_uppercase).collect();
            assert_eq!(kmer.to_bases().as_ref(), normalized.as_slice(), "bases not normalized on accept");
        }
        Err(bad_index) => {
            assert!(bad_index < data.len(), "error index {bad_index} out of bounds for input of length {}", data.len());
        }
    }
});

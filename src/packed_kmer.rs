//! Bit-packed k-mer representation (§3, §4.1).
//!
//! A [`PackedKmer`] holds up to [`PackedKmer::MAX_LEN`] bases in a single
//! 128-bit register (two 64-bit words, MSB-aligned), plus a length and a
//! count. [`Minimer`] is the same value without length/count, self-delimited
//! by a trailing terminator pair so it round-trips through flat files with
//! no external length field.
//!
//! # Bit layout
//!
//! Bases are pushed MSB-first: each [`PackedKmer::push`] shifts the whole
//! register right by 2 bits and writes the new base into the top 2 bits, so
//! the most-recently-pushed base sits at the high end and the oldest
//! retained base sits just above the zero padding. [`PackedKmer::truncate`]
//! keeps the top `L` bases and zeroes the rest — because "top" here means
//! "most recently pushed", truncating a maximal-length window produced by
//! scanning forward yields exactly the shorter k-mer ending at the same
//! position, with no re-scan required (§4.6).

use bio::alphabets::dna::revcomp;
use bytes::Bytes;
use std::cmp::Ordering;

/// Total bit width of the packed register (two 64-bit words).
const WIDTH: u32 = 128;

/// A bit-packed, fixed-width k-mer value with an associated count.
///
/// Two `PackedKmer` values are equal iff their lengths are equal and all
/// significant bits are equal (§3).
#[derive(Debug, Clone, Copy, Default)]
pub struct PackedKmer {
    bits: u128,
    length: u32,
    count: u32,
}

impl PackedKmer {
    /// Longest k-mer this type can hold. Capped at 63 (not 64) so that the
    /// [`Minimer`] terminator pair always has a free slot below the content.
    pub const MAX_LEN: u32 = 63;

    /// An empty k-mer (length 0, count 1).
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: 0, length: 0, count: 1 }
    }

    #[must_use]
    pub const fn len(&self) -> u32 {
        self.length
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    pub fn set_count(&mut self, count: u32) {
        self.count = count;
    }

    /// Shifts existing bases toward the LSB and writes `code` (0..=3) into
    /// the top 2 bits. When already at [`Self::MAX_LEN`], the oldest
    /// retained base is shifted out and discarded; length saturates.
    pub fn push(&mut self, code: u8) {
        debug_assert!(code <= 3, "base code must be 0..=3");
        self.bits = (self.bits >> 2) | (u128::from(code) << (WIDTH - 2));
        self.length = (self.length + 1).min(Self::MAX_LEN);
    }

    /// Keeps the top `new_len` bases (the most recently pushed), zeroing
    /// the rest. Requires `new_len <= self.len()`.
    pub fn truncate(&mut self, new_len: u32) {
        debug_assert!(new_len <= self.length, "cannot truncate to a longer length");
        self.bits = if new_len == 0 {
            0
        } else {
            self.bits & (u128::MAX << (WIDTH - 2 * new_len))
        };
        self.length = new_len;
    }

    /// Lexicographic comparison on significant bits (MSB first); ties break
    /// on length, shorter first (§4.1).
    #[must_use]
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.bits.cmp(&other.bits).then(self.length.cmp(&other.length))
    }

    /// Top 12 bits of the MSB-aligned value; the sector-routing key.
    #[must_use]
    pub fn prefix(&self) -> u16 {
        (self.bits >> (WIDTH - 12)) as u16
    }

    /// Converts to the self-delimiting [`Minimer`] transport form.
    #[must_use]
    pub fn to_minimer(&self) -> Minimer {
        let marker_lo_bit = WIDTH - 2 * self.length - 2;
        let marker = 0b11u128 << marker_lo_bit;
        Minimer(self.bits | marker)
    }

    /// Recovers a `PackedKmer` (count defaulted to 1) from its `Minimer`
    /// transport form by locating the lowest terminator pair.
    #[must_use]
    pub fn from_minimer(m: Minimer) -> Self {
        // Content occupies bits strictly above the terminator, so scanning
        // from the LSB upward can never mistake a base for the marker.
        let pair = (0..64)
            .find(|i| (m.0 >> (2 * i)) & 0b11 == 0b11)
            .unwrap_or(63);
        let length = 63 - pair;
        let bits = m.0 & (u128::MAX << (2 * pair + 2));
        Self { bits, length, count: 1 }
    }

    /// Builds a `PackedKmer` from ASCII bases (A/C/G/T, case-insensitive),
    /// pushing them in order so the natural (oldest-first) order is
    /// preserved by [`Self::to_bases`].
    ///
    /// # Errors
    ///
    /// Returns the index of the first byte that isn't a valid DNA base, or
    /// `Err(bases.len())` if `bases` is longer than [`Self::MAX_LEN`].
    pub fn from_bases(bases: &[u8]) -> Result<Self, usize> {
        if bases.len() > Self::MAX_LEN as usize {
            return Err(bases.len());
        }
        let mut kmer = Self::new();
        for (i, &b) in bases.iter().enumerate() {
            let code = base_to_code(b).ok_or(i)?;
            kmer.push(code);
        }
        Ok(kmer)
    }

    /// Reconstructs the ASCII bases in natural (oldest-to-newest) order.
    #[must_use]
    pub fn to_bases(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.length as usize);
        let base_shift = WIDTH - 2 * self.length;
        for i in 0..self.length {
            let code = ((self.bits >> (base_shift + 2 * i)) & 0b11) as u8;
            out.push(code_to_base(code));
        }
        Bytes::from(out)
    }

    /// The reverse complement of this k-mer, grounded on the same
    /// `bio::alphabets::dna::revcomp` call the counting library uses.
    #[must_use]
    pub fn reverse_complement(&self) -> Self {
        let bases = self.to_bases();
        let rc = revcomp(bases.as_ref());
        Self::from_bases(&rc).unwrap_or_default()
    }

    /// The lexicographically smaller of `self` and its reverse complement,
    /// compared on natural base order (not the internal bit order).
    #[must_use]
    pub fn canonical(&self) -> Self {
        let rc = self.reverse_complement();
        if rc.to_bases() < self.to_bases() {
            rc
        } else {
            *self
        }
    }
}

/// Maps a DNA base byte to its 2-bit code: A/a=0, C/c=1, T/t=2, G/g=3.
///
/// Uses the identity `(byte >> 1) & 3`, valid for exactly these eight
/// bytes; any other alphabetic or non-alphabetic byte is rejected.
#[must_use]
pub fn base_to_code(byte: u8) -> Option<u8> {
    if matches!(byte, b'A' | b'a' | b'C' | b'c' | b'G' | b'g' | b'T' | b't') {
        Some((byte >> 1) & 0b11)
    } else {
        None
    }
}

#[must_use]
fn code_to_base(code: u8) -> u8 {
    match code {
        0 => b'A',
        1 => b'C',
        2 => b'T',
        3 => b'G',
        _ => unreachable!("2-bit code is always 0..=3"),
    }
}

impl PartialEq for PackedKmer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key(other) == Ordering::Equal
    }
}
impl Eq for PackedKmer {}

impl PartialOrd for PackedKmer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PackedKmer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key(other)
    }
}

/// The self-delimiting transport form of a [`PackedKmer`] (§3).
///
/// Prepends a terminator bit pair (`11`) immediately below the lowest
/// significant base, so `(bases, length)` round-trips with no external
/// length field. Serialized as 16 little-endian bytes (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Minimer(pub u128);

impl Minimer {
    pub const ENCODED_LEN: usize = 16;

    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::ENCODED_LEN] {
        self.0.to_le_bytes()
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::ENCODED_LEN]) -> Self {
        Self(u128::from_le_bytes(bytes))
    }
}

//! Word-level signature scanning and DS Protect reference data.
//!
//! Code regions are converted once into little-endian `u32` words and matched
//! with 32-bit compares. Signature anchors are effectively random words, so a
//! plain "find the anchor, then verify" scan is all that is needed.

mod db;
mod tables;

use thiserror::Error;

pub use db::{GarbageTag, SignatureDb, SignatureDbError, StartSignature, VersionSignatures};
pub use tables::{MAC_MARKER, SIGNATURE_LEN};

/// Fixed-length word pattern.
pub type Signature = [u32; SIGNATURE_LEN];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("region of {0} bytes is not a whole number of words")]
    UnalignedRegion(usize),
}

/// Convert a byte region into little-endian words.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<u32>, ShapeError> {
    if bytes.len() % 4 != 0 {
        return Err(ShapeError::UnalignedRegion(bytes.len()));
    }
    Ok(bytes.chunks_exact(4).map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]])).collect())
}

/// Lowest index at which `needle` occurs contiguously in `haystack`.
///
/// An empty needle matches at index 0.
pub fn find(haystack: &[u32], needle: &[u32]) -> Option<usize> {
    find_from(haystack, needle, 0)
}

/// Like [`find`], but only considers start indices `>= from`.
pub fn find_from(haystack: &[u32], needle: &[u32], from: usize) -> Option<usize> {
    let Some((&anchor, rest)) = needle.split_first() else {
        return (from <= haystack.len()).then_some(from);
    };
    if needle.len() > haystack.len() {
        return None;
    }
    // Last start index at which the whole needle still fits.
    let last = haystack.len() - needle.len();
    if from > last {
        return None;
    }

    haystack[from..=last]
        .iter()
        .enumerate()
        .filter(|&(_, &w)| w == anchor)
        .map(|(i, _)| from + i)
        .find(|&idx| haystack[idx + 1..idx + needle.len()] == *rest)
}

/// Encryption keys exposed by the guard's exported functions.
///
/// Each key is the low half of a `0xEB00xxxx` word directly following a word
/// whose top byte is `0xEA`.
pub fn encryption_keys(words: &[u32]) -> Vec<u16> {
    words
        .windows(2)
        .filter(|pair| pair[0] >> 24 == 0xEA && pair[1] >> 16 == 0xEB00)
        .map(|pair| pair[1] as u16)
        .collect()
}

/// Walk backward from `from` (inclusive) to the nearest word equal to `sentinel`.
pub fn find_start_word(haystack: &[u32], from: usize, sentinel: u32) -> Option<usize> {
    if haystack.is_empty() {
        return None;
    }
    let from = from.min(haystack.len() - 1);
    (0..=from).rev().find(|&idx| haystack[idx] == sentinel)
}

//! Backward LZSS codec used for compressed ARM9 code modules.
//!
//! Stored modules end with an 8-byte footer followed (in memory order, before it)
//! by a compressed tail that the console decodes in place, walking downward.
//! Here decoding is split into two phases instead:
//! 1. copy the compressed tail out and reverse it, so it reads front to back;
//! 2. decode it into a fresh buffer whose back-references only ever point at
//!    already-produced output, then reverse the result back.
//!
//! A displacement measured in the reversed stream equals the displacement
//! measured backward from the write cursor of the in-place decoder, so both
//! produce byte-identical output.

mod encode;

use thiserror::Error;

pub use encode::compress;

/// Shortest back-reference length (and displacement bias).
pub const MIN_MATCH: usize = 3;
/// Longest back-reference length a token can express.
pub const MAX_MATCH: usize = 0xF + MIN_MATCH;
/// Largest displacement a token can express.
pub const MAX_DISPLACEMENT: usize = 0xFFF + MIN_MATCH;
/// Size of the trailing footer.
pub const FOOTER_LEN: usize = 8;
/// Upper bound on decoded bytes per stream byte: a flag byte plus eight
/// maximal tokens (17 bytes) yield at most 144 bytes.
pub const MAX_EXPANSION: usize = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecompressionError {
    #[error("stored module is {0} bytes, too short for a footer")]
    TooShort(usize),

    #[error("inconsistent footer: padding {padding:#x}, end delta {end_delta:#x}, stored length {stored_len:#x}")]
    BadFooter { padding: usize, end_delta: usize, stored_len: usize },

    #[error("compressed stream exhausted after {produced:#x} of {expected:#x} bytes")]
    Exhausted { produced: usize, expected: usize },

    #[error("back-reference of {displacement:#x} bytes reaches before the start of output ({produced:#x} bytes)")]
    BadBackReference { displacement: usize, produced: usize },

    #[error("footer declares {declared:#x} decoded bytes, more than a {stream_len:#x}-byte stream can hold")]
    ImplausibleSize { declared: usize, stream_len: usize },

    #[error("back-reference overruns the expected length {expected:#x} (would reach {reached:#x})")]
    Overrun { expected: usize, reached: usize },
}

/// Parsed trailing footer of a compressed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Bytes at the very end (footer included) that are not part of the stream.
    pub padding: usize,
    /// Distance from the end of the stored module to the start of the compressed tail.
    pub end_delta: usize,
    /// How much longer the module becomes once decompressed.
    pub start_delta: usize,
}

impl Footer {
    /// Parse and sanity-check the footer of `stored`.
    pub fn parse(stored: &[u8]) -> Result<Self, DecompressionError> {
        let len = stored.len();
        if len < FOOTER_LEN {
            return Err(DecompressionError::TooShort(len));
        }
        let raw = &stored[len - FOOTER_LEN..];
        let end_delta_raw = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let start_delta = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);

        let footer = Footer {
            padding: (end_delta_raw >> 24) as usize,
            end_delta: (end_delta_raw & 0x00FF_FFFF) as usize,
            start_delta: start_delta as usize,
        };
        if footer.padding < FOOTER_LEN || footer.padding > footer.end_delta || footer.end_delta > len
        {
            return Err(DecompressionError::BadFooter {
                padding: footer.padding,
                end_delta: footer.end_delta,
                stored_len: len,
            });
        }
        let stream_len = footer.end_delta - footer.padding;
        let declared = footer.decompressed_size();
        if declared > stream_len.saturating_mul(MAX_EXPANSION) {
            return Err(DecompressionError::ImplausibleSize { declared, stream_len });
        }
        Ok(footer)
    }

    /// Length of the decoded tail.
    pub fn decompressed_size(&self) -> usize {
        self.start_delta.saturating_add(self.end_delta)
    }
}

/// Decompress a stored module, returning `stored.len() + start_delta` bytes.
pub fn decompress(stored: &[u8]) -> Result<Vec<u8>, DecompressionError> {
    let footer = Footer::parse(stored)?;
    let tail_start = stored.len() - footer.end_delta;
    let stream_end = stored.len() - footer.padding;

    let reversed: Vec<u8> = stored[tail_start..stream_end].iter().rev().copied().collect();
    let mut decoded = decode_forward(&reversed, footer.decompressed_size())?;
    decoded.reverse();

    let mut out = Vec::with_capacity(tail_start + decoded.len());
    out.extend_from_slice(&stored[..tail_start]);
    out.extend_from_slice(&decoded);
    Ok(out)
}

/// Decompress the ARM9 static region.
///
/// Only the bytes up to `compressed_end` (a RAM address from the module
/// parameters) are compressed; whatever follows is carried over untouched.
/// An end address outside the region means the whole region is compressed.
pub fn decompress_static(
    stored: &[u8],
    ram_start: u32,
    compressed_end: u32,
) -> Result<Vec<u8>, DecompressionError> {
    let limit = compressed_end
        .checked_sub(ram_start)
        .map(|l| l as usize)
        .filter(|&l| l <= stored.len())
        .unwrap_or(stored.len());

    let mut out = decompress(&stored[..limit])?;
    out.extend_from_slice(&stored[limit..]);
    Ok(out)
}

/// Conventional forward LZSS decode of exactly `target` bytes.
fn decode_forward(input: &[u8], target: usize) -> Result<Vec<u8>, DecompressionError> {
    let mut out: Vec<u8> = Vec::with_capacity(target.min(input.len() * MAX_EXPANSION));
    let mut bytes = input.iter().copied();
    let exhausted = |produced: usize| DecompressionError::Exhausted { produced, expected: target };

    while out.len() < target {
        let flags = bytes.next().ok_or_else(|| exhausted(out.len()))?;

        for bit in 0..8 {
            if out.len() >= target {
                break;
            }

            if flags & (0x80 >> bit) == 0 {
                let literal = bytes.next().ok_or_else(|| exhausted(out.len()))?;
                out.push(literal);
                continue;
            }

            let hi = bytes.next().ok_or_else(|| exhausted(out.len()))?;
            let lo = bytes.next().ok_or_else(|| exhausted(out.len()))?;
            let token = u16::from_be_bytes([hi, lo]) as usize;
            let count = (token >> 12) + MIN_MATCH;
            let displacement = (token & 0xFFF) + MIN_MATCH;

            if displacement > out.len() {
                return Err(DecompressionError::BadBackReference {
                    displacement,
                    produced: out.len(),
                });
            }
            if out.len() + count > target {
                return Err(DecompressionError::Overrun {
                    expected: target,
                    reached: out.len() + count,
                });
            }

            // Byte at a time: the source may overlap bytes produced by this same copy.
            for _ in 0..count {
                let byte = out[out.len() - displacement];
                out.push(byte);
            }
        }
    }

    Ok(out)
}

//! Nintendo DS cartridge container reader.
//!
//! Only the pieces needed to reach executable code are parsed:
//! - title/game code and the ARM9 static region descriptor
//! - the file allocation table (FAT)
//! - the ARM9 overlay table
//!
//! Every read is bounds-checked against the real file length so truncated or
//! corrupt images surface as `ContainerError::Malformed` instead of short reads.

mod header;
mod tables;

use std::io::{self, Read, Seek, SeekFrom};

use thiserror::Error;

pub use header::{read_arm9_descriptor, read_rom_info, read_table_region, Arm9Descriptor, RomInfo};
pub use tables::{
    read_fat, read_overlay_table, FatEntry, OverlayEntry, TableRegion, OVERLAY_COMPRESSED,
};

/// Header offset of the ARM9 static region descriptor.
pub const ARM9_DESCRIPTOR_OFFSET: u64 = 0x20;
/// Header offset of the FAT location/size pair.
pub const FAT_REGION_OFFSET: u64 = 0x48;
/// Header offset of the ARM9 overlay table location/size pair.
pub const ARM9_OVERLAY_REGION_OFFSET: u64 = 0x50;
/// Header offset of the tail of the Nintendo logo plus the logo checksum.
pub const LOGO_TAIL_OFFSET: u64 = 0x14E;

/// Expected bytes at `LOGO_TAIL_OFFSET` on every licensed cartridge.
pub const LOGO_TAIL: [u8; 16] = [
    0x3C, 0xAF, 0xD6, 0x25, 0xE4, 0x8B, 0x38, 0x0A, 0xAC, 0x72, 0x21, 0xD4, 0xF8, 0x07, 0x56, 0xCF,
];

/// Smallest plausible cartridge image (8 MiB).
pub const MIN_ROM_SIZE: u64 = 8 * 1024 * 1024;
/// Largest plausible cartridge image (512 MiB).
pub const MAX_ROM_SIZE: u64 = 512 * 1024 * 1024;

/// Error type for container reads.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// A header field or table points outside the file, or a table has a bad shape.
    #[error("Malformed container: {what} ({len:#x} bytes at {offset:#x})")]
    Malformed { what: &'static str, offset: u64, len: u64 },

    /// The image failed the minimal cartridge sanity check.
    #[error("Invalid ROM: {0}")]
    InvalidRom(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience result type for container reads.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Total length of a seekable source. Restores nothing; callers always seek before reading.
pub fn source_len<R: Seek>(rom: &mut R) -> ContainerResult<u64> {
    Ok(rom.seek(SeekFrom::End(0))?)
}

/// Read exactly `len` bytes at `offset`, failing with `Malformed` if the range passes EOF.
pub fn read_exact_at<R: Read + Seek>(
    rom: &mut R,
    what: &'static str,
    offset: u64,
    len: u64,
) -> ContainerResult<Vec<u8>> {
    let total = source_len(rom)?;
    let in_bounds = offset.checked_add(len).map(|end| end <= total).unwrap_or(false);
    if !in_bounds {
        return Err(ContainerError::Malformed { what, offset, len });
    }

    rom.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len as usize];
    rom.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => ContainerError::Malformed { what, offset, len },
        _ => ContainerError::Io(e),
    })?;
    Ok(buf)
}

/// Minimal structural check: plausible size and the fixed logo tail.
///
/// Power-of-two sizes are not enforced because trimmed images are common.
pub fn validate<R: Read + Seek>(rom: &mut R) -> ContainerResult<()> {
    let size = source_len(rom)?;
    if !(MIN_ROM_SIZE..=MAX_ROM_SIZE).contains(&size) {
        return Err(ContainerError::InvalidRom(format!(
            "size {size} bytes is outside {MIN_ROM_SIZE}..={MAX_ROM_SIZE}"
        )));
    }

    let logo = read_exact_at(rom, "logo checksum", LOGO_TAIL_OFFSET, LOGO_TAIL.len() as u64)?;
    if logo != LOGO_TAIL {
        return Err(ContainerError::InvalidRom("logo checksum mismatch".into()));
    }
    Ok(())
}

/// Decode a little-endian u32 at `pos`. Callers guarantee `pos + 4 <= bytes.len()`.
pub(crate) fn le_u32(bytes: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use super::{
    le_u32, read_exact_at, read_table_region, ContainerError, ContainerResult,
    ARM9_OVERLAY_REGION_OFFSET, FAT_REGION_OFFSET,
};

/// Overlay flag bit marking the stored file as backward-LZSS compressed.
pub const OVERLAY_COMPRESSED: u32 = 0x0100_0000;

/// Sub-range of the ROM holding a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegion {
    pub offset: u32,
    pub size: u32,
}

/// Byte range of one stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatEntry {
    pub start: u32,
    pub end: u32,
}

impl FatEntry {
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row of the ARM9 overlay table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub id: u32,
    pub ram_start: u32,
    pub size: u32,
    pub bss_size: u32,
    pub sinit_start: u32,
    pub sinit_end: u32,
    pub file_id: u32,
    pub flags: u32,
}

impl OverlayEntry {
    pub fn is_compressed(&self) -> bool {
        self.flags & OVERLAY_COMPRESSED != 0
    }

    /// A zero `sinit_start` means the overlay has no static initializers.
    pub fn has_sinit(&self) -> bool {
        self.sinit_start != 0
    }

    /// `sinit_start >= ram_start`, or no sinit region at all.
    pub fn sinit_in_range(&self) -> bool {
        !self.has_sinit() || self.sinit_start >= self.ram_start
    }

    /// Byte offset of the static-initializer region within the loaded overlay.
    pub fn sinit_offset(&self) -> Option<usize> {
        if !self.has_sinit() {
            return None;
        }
        self.sinit_start.checked_sub(self.ram_start).map(|off| off as usize)
    }
}

fn read_table<R: Read + Seek>(
    rom: &mut R,
    what: &'static str,
    region: TableRegion,
    record_size: u32,
) -> ContainerResult<Vec<u8>> {
    if region.size % record_size != 0 {
        return Err(ContainerError::Malformed {
            what,
            offset: region.offset as u64,
            len: region.size as u64,
        });
    }
    read_exact_at(rom, what, region.offset as u64, region.size as u64)
}

/// Read the file allocation table, indexed by file id.
pub fn read_fat<R: Read + Seek>(rom: &mut R) -> ContainerResult<Vec<FatEntry>> {
    let region = read_table_region(rom, "FAT region", FAT_REGION_OFFSET)?;
    let raw = read_table(rom, "FAT", region, 8)?;
    Ok(raw
        .chunks_exact(8)
        .map(|rec| FatEntry { start: le_u32(rec, 0), end: le_u32(rec, 4) })
        .collect())
}

/// Read the ARM9 overlay table.
pub fn read_overlay_table<R: Read + Seek>(rom: &mut R) -> ContainerResult<Vec<OverlayEntry>> {
    let region = read_table_region(rom, "ARM9 overlay region", ARM9_OVERLAY_REGION_OFFSET)?;
    let raw = read_table(rom, "ARM9 overlay table", region, 32)?;
    Ok(raw
        .chunks_exact(32)
        .map(|rec| OverlayEntry {
            id: le_u32(rec, 0),
            ram_start: le_u32(rec, 4),
            size: le_u32(rec, 8),
            bss_size: le_u32(rec, 12),
            sinit_start: le_u32(rec, 16),
            sinit_end: le_u32(rec, 20),
            file_id: le_u32(rec, 24),
            flags: le_u32(rec, 28),
        })
        .collect())
}

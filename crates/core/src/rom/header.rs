use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use super::{le_u32, read_exact_at, ContainerResult, TableRegion, ARM9_DESCRIPTOR_OFFSET};

/// Title and game code from the cartridge header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomInfo {
    pub title: String,
    pub game_code: String,
}

/// Location of the ARM9 static region in the file and in RAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arm9Descriptor {
    pub code_offset: u32,
    pub entry_point: u32,
    pub ram_start: u32,
    pub size: u32,
}

/// Read the 12-byte title and 4-byte game code at the start of the header.
pub fn read_rom_info<R: Read + Seek>(rom: &mut R) -> ContainerResult<RomInfo> {
    let raw = read_exact_at(rom, "title", 0, 0x10)?;
    let title = String::from_utf8_lossy(&raw[..0xC]).trim_end_matches('\0').to_string();
    let game_code = String::from_utf8_lossy(&raw[0xC..0x10])
        .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string();
    Ok(RomInfo { title, game_code })
}

pub fn read_arm9_descriptor<R: Read + Seek>(rom: &mut R) -> ContainerResult<Arm9Descriptor> {
    let raw = read_exact_at(rom, "ARM9 descriptor", ARM9_DESCRIPTOR_OFFSET, 16)?;
    Ok(Arm9Descriptor {
        code_offset: le_u32(&raw, 0),
        entry_point: le_u32(&raw, 4),
        ram_start: le_u32(&raw, 8),
        size: le_u32(&raw, 12),
    })
}

/// Read an `{offset, size}` pair at a fixed header offset.
pub fn read_table_region<R: Read + Seek>(
    rom: &mut R,
    what: &'static str,
    header_offset: u64,
) -> ContainerResult<TableRegion> {
    let raw = read_exact_at(rom, what, header_offset, 8)?;
    Ok(TableRegion { offset: le_u32(&raw, 0), size: le_u32(&raw, 4) })
}

//! Minimal on-disk cartridge images for CLI runs.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use dsprot_core::rom::{LOGO_TAIL, LOGO_TAIL_OFFSET, MIN_ROM_SIZE};
use dsprot_core::signatures::SignatureDb;
use dsprot_core::VersionId;

const NOP: u32 = 0xE1A0_0000;
pub const OVERLAY_RAM: u32 = 0x0219_0000;

pub fn identifying(label: &str) -> Vec<u32> {
    let db = SignatureDb::builtin();
    db.get(&VersionId::from(label)).and_then(|v| v.identifying).expect("known version").to_vec()
}

/// Single uncompressed overlay holding `overlay_words` behind a NOP sled.
pub fn rom_with_overlay(game_code: &str, overlay_words: &[u32], full_size: bool) -> Vec<u8> {
    let mut rom = vec![0u8; 0x200];
    rom[..10].copy_from_slice(b"DSPROTTEST");
    rom[0xC..0x10].copy_from_slice(&game_code.as_bytes()[..4]);
    let logo = LOGO_TAIL_OFFSET as usize;
    rom[logo..logo + LOGO_TAIL.len()].copy_from_slice(&LOGO_TAIL);

    let arm9_offset = rom.len() as u32;
    push_words(&mut rom, &[NOP; 32]);

    let overlay_start = rom.len() as u32;
    push_words(&mut rom, &[NOP; 16]);
    push_words(&mut rom, overlay_words);
    push_words(&mut rom, &[NOP; 16]);
    let overlay_end = rom.len() as u32;

    let fat_offset = rom.len() as u32;
    push_words(&mut rom, &[overlay_start, overlay_end]);
    let ovt_offset = rom.len() as u32;
    push_words(&mut rom, &[0, OVERLAY_RAM, overlay_end - overlay_start, 0, 0, 0, 0, 0]);

    for (offset, value) in [
        (0x20, arm9_offset),
        (0x24, 0x0200_0000),
        (0x28, 0x0200_0000),
        (0x2C, 32 * 4),
        (0x48, fat_offset),
        (0x4C, 8),
        (0x50, ovt_offset),
        (0x54, 32),
    ] {
        rom[offset..offset + 4].copy_from_slice(&u32::to_le_bytes(value));
    }

    if full_size {
        rom.resize(MIN_ROM_SIZE as usize, 0xFF);
    }
    rom
}

pub fn write_rom(dir: &Path, bytes: &[u8]) -> PathBuf {
    let path = dir.join("game.nds");
    fs::write(&path, bytes).expect("write rom");
    path
}

fn push_words(buf: &mut Vec<u8>, words: &[u32]) {
    for word in words {
        buf.extend_from_slice(&word.to_le_bytes());
    }
}

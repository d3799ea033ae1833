//! Synthetic cartridge images for integration tests.
#![allow(dead_code)]

use dsprot_core::compression::compress;
use dsprot_core::rom::{LOGO_TAIL, LOGO_TAIL_OFFSET, MIN_ROM_SIZE, OVERLAY_COMPRESSED};
use dsprot_core::signatures::{Signature, SignatureDb, VersionSignatures};
use dsprot_core::VersionId;

/// `MOV R0, R0`; harmless filler that never looks like a pointer, epilogue, or key.
pub const NOP: u32 = 0xE1A0_0000;
pub const BX_LR: u32 = 0xE12F_FF1E;
pub const MAC_MARKER: [u32; 2] = [0xFF40_F6FF, 0x0000_CEFF];
pub const ARM9_RAM_START: u32 = 0x0200_0000;
pub const MODULE_PARAMS_MAGIC: u32 = 0x2106_C0DE;

pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

pub fn nops(count: usize) -> Vec<u32> {
    vec![NOP; count]
}

pub fn builtin_version(label: &str) -> VersionSignatures {
    SignatureDb::builtin().get(&VersionId::from(label)).cloned().expect("known version")
}

pub fn identifying(label: &str) -> Signature {
    builtin_version(label).identifying.expect("identifying signature")
}

/// Guard body for `label`: prologue, start anchor, identifying signature, and the
/// proof signatures whose 1-based index is not listed in `stripped`.
///
/// Returns the words and the word index of the prologue.
pub fn guard_words(label: &str, stripped: &[usize]) -> (Vec<u32>, usize) {
    let version = builtin_version(label);
    let mut words = nops(8);
    let mut prologue = words.len();

    if let Some(start) = &version.start {
        prologue = words.len();
        if start.signature[0] != start.start_word {
            words.push(start.start_word);
            words.extend(nops(3));
        }
        words.extend_from_slice(&start.signature);
        words.extend(nops(4));
    }
    if let Some(sig) = version.identifying {
        words.extend_from_slice(&sig);
        words.extend(nops(4));
    }
    for (i, proof) in version.deadstrip_proofs.iter().flatten().enumerate() {
        if !stripped.contains(&(i + 1)) {
            words.extend_from_slice(proof);
        }
        words.extend(nops(2));
    }
    words.extend(nops(8));
    (words, prologue)
}

#[derive(Debug, Clone)]
pub struct OverlayFixture {
    pub id: u32,
    pub ram_start: u32,
    pub code: Vec<u8>,
    pub compress: bool,
    pub sinit_start: u32,
    pub file_id: Option<u32>,
}

impl OverlayFixture {
    pub fn new(id: u32, ram_start: u32, code: Vec<u8>) -> Self {
        Self { id, ram_start, code, compress: false, sinit_start: 0, file_id: None }
    }

    pub fn compressed(mut self) -> Self {
        self.compress = true;
        self
    }

    /// Place the sinit region `offset` bytes into the overlay.
    pub fn with_sinit_at(mut self, offset: u32) -> Self {
        self.sinit_start = self.ram_start + offset;
        self
    }

    pub fn with_file_id(mut self, file_id: u32) -> Self {
        self.file_id = Some(file_id);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RomBuilder {
    pub title: String,
    pub game_code: String,
    pub arm9_code: Vec<u8>,
    pub arm9_entry_offset: u32,
    pub overlays: Vec<OverlayFixture>,
    pub full_size: bool,
}

impl Default for RomBuilder {
    fn default() -> Self {
        Self {
            title: "DSPROTTEST".into(),
            game_code: "ADTE".into(),
            arm9_code: words_to_bytes(&nops(64)),
            arm9_entry_offset: 0,
            overlays: Vec::new(),
            full_size: false,
        }
    }
}

impl RomBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game_code(mut self, code: &str) -> Self {
        self.game_code = code.into();
        self
    }

    pub fn arm9(mut self, code: Vec<u8>) -> Self {
        self.arm9_code = code;
        self
    }

    pub fn overlay(mut self, overlay: OverlayFixture) -> Self {
        self.overlays.push(overlay);
        self
    }

    /// Pad the image to the minimum plausible cartridge size.
    pub fn full_size(mut self) -> Self {
        self.full_size = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut rom = vec![0u8; 0x200];
        let title = self.title.as_bytes();
        rom[..title.len().min(12)].copy_from_slice(&title[..title.len().min(12)]);
        rom[0xC..0x10].copy_from_slice(&self.game_code.as_bytes()[..4]);
        let logo = LOGO_TAIL_OFFSET as usize;
        rom[logo..logo + LOGO_TAIL.len()].copy_from_slice(&LOGO_TAIL);

        let arm9_offset = rom.len() as u32;
        rom.extend_from_slice(&self.arm9_code);
        align4(&mut rom);

        let mut fat = Vec::new();
        for overlay in &self.overlays {
            let stored = if overlay.compress {
                compress(&overlay.code).expect("overlay fixture must be compressible")
            } else {
                overlay.code.clone()
            };
            let start = rom.len() as u32;
            rom.extend_from_slice(&stored);
            fat.push((start, rom.len() as u32));
            align4(&mut rom);
        }

        let fat_offset = rom.len() as u32;
        for (start, end) in &fat {
            push_u32(&mut rom, *start);
            push_u32(&mut rom, *end);
        }

        let ovt_offset = rom.len() as u32;
        for (i, overlay) in self.overlays.iter().enumerate() {
            let flags = if overlay.compress { OVERLAY_COMPRESSED } else { 0 };
            for word in [
                overlay.id,
                overlay.ram_start,
                overlay.code.len() as u32,
                0,
                overlay.sinit_start,
                overlay.sinit_start,
                overlay.file_id.unwrap_or(i as u32),
                flags,
            ] {
                push_u32(&mut rom, word);
            }
        }

        put_u32(&mut rom, 0x20, arm9_offset);
        put_u32(&mut rom, 0x24, ARM9_RAM_START + self.arm9_entry_offset);
        put_u32(&mut rom, 0x28, ARM9_RAM_START);
        put_u32(&mut rom, 0x2C, self.arm9_code.len() as u32);
        put_u32(&mut rom, 0x48, fat_offset);
        put_u32(&mut rom, 0x4C, (fat.len() * 8) as u32);
        put_u32(&mut rom, 0x50, ovt_offset);
        put_u32(&mut rom, 0x54, (self.overlays.len() * 32) as u32);

        if self.full_size && (rom.len() as u64) < MIN_ROM_SIZE {
            rom.resize(MIN_ROM_SIZE as usize, 0xFF);
        }
        rom
    }
}

/// ARM9 static region with crt0 module parameters near the entry point.
///
/// `body` is compressed when `compress_body` is set; `compressed_static_end`
/// then points at the end of the compressed data and a 12-byte trailer
/// follows it uncompressed.
pub fn static_region(body: &[u32], compress_body: bool) -> Vec<u8> {
    let mut head = nops(8);
    let params_at = head.len();
    // autoload list start/end, autoload start, bss start/end, compressed end, sdk, magic BE, magic LE
    head.extend([0, 0, 0, 0, 0, 0, 0x0400_0000, 0xDEC0_0621, MODULE_PARAMS_MAGIC]);
    head.extend(nops(7));

    let body_bytes = words_to_bytes(body);
    if !compress_body {
        let mut out = words_to_bytes(&head);
        out.extend_from_slice(&body_bytes);
        return out;
    }

    let stored_body = compress(&body_bytes).expect("static fixture must be compressible");
    let compressed_len = (head.len() * 4 + stored_body.len()) as u32;
    head[params_at + 5] = ARM9_RAM_START + compressed_len;

    let mut out = words_to_bytes(&head);
    out.extend_from_slice(&stored_body);
    out.extend_from_slice(&words_to_bytes(&[0xDEC0_0621, 0x0000_0B54, 0x0000_4000]));
    out
}

fn align4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

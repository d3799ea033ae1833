use std::io::{Read, Seek};

use thiserror::Error;

use crate::compression::{decompress, decompress_static, DecompressionError};
use crate::model::{CodeBuffer, DetectionResult, ScanOptions, ScanOutcome, ScanReport};
use crate::rom::{
    read_arm9_descriptor, read_exact_at, read_fat, read_overlay_table, read_rom_info, validate,
    Arm9Descriptor, ContainerError, FatEntry, OverlayEntry,
};
use crate::services::classifier::Classifier;
use crate::signatures::{ShapeError, SignatureDb};

/// Game-code prefix of Golden Sun: Dark Dawn, whose code compression is unsupported.
pub const UNSUPPORTED_TITLE_PREFIX: &str = "BO5";

/// Fixed notice reported instead of a scan for the unsupported title.
pub const UNSUPPORTED_NOTICE: [&str; 6] = [
    "WARNING: Golden Sun - Dark Dawn",
    "",
    "This game has DS Protect 2.01 in overlay 334, and 2.01 Instant in overlay 335.",
    "",
    "This is a hardcoded printout. This game cannot be analyzed normally.",
    "It uses a proprietary method of code compression that is currently unsupported.",
];

/// `nitroCode` word closing the module parameters in crt0.
pub const MODULE_PARAMS_MAGIC: u32 = 0x2106C0DE;
/// Bytes after the entry point searched for the module parameters.
const MODULE_PARAMS_SEARCH_LEN: usize = 0x1000;
/// Distance (in words) from the magic back to `compressed_static_end`.
const COMPRESSED_END_BACK: usize = 3;

pub const STATIC_REGION_LABEL: &str = "static region";

/// Errors that abort the whole pass.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Errors confined to one region; the pass continues with the next one.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Decompression(#[from] DecompressionError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("file id {file_id} is past the end of the FAT ({fat_len} entries)")]
    FileIdOutOfRange { file_id: u32, fat_len: usize },
    #[error("file {file_id} ends ({end:#x}) before it starts ({start:#x})")]
    InvertedFileRange { file_id: u32, start: u32, end: u32 },
    #[error("sinit start {sinit_start:#010x} precedes load address {ram_start:#010x}")]
    SinitBeforeLoad { sinit_start: u32, ram_start: u32 },
}

/// What the module parameters say about the static region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticCompression {
    /// Compressed up to this RAM address.
    Compressed { end: u32 },
    Uncompressed,
    /// Module parameters not found near the entry point.
    Unknown,
}

pub fn is_unsupported_title(game_code: &str) -> bool {
    game_code.starts_with(UNSUPPORTED_TITLE_PREFIX)
}

/// Probe the module parameters near the entry point.
pub fn static_compression(stored: &[u8], arm9: &Arm9Descriptor) -> StaticCompression {
    let Some(start) = arm9.entry_point.checked_sub(arm9.ram_start).map(|s| s as usize) else {
        return StaticCompression::Unknown;
    };
    let start = start.min(stored.len());
    let end = start.saturating_add(MODULE_PARAMS_SEARCH_LEN).min(stored.len());
    let words: Vec<u32> = stored[start..end]
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect();

    // `pos` counts from the skipped words, so it already indexes `compressed_static_end`.
    match words.iter().skip(COMPRESSED_END_BACK).position(|&w| w == MODULE_PARAMS_MAGIC) {
        None => StaticCompression::Unknown,
        Some(pos) => match words[pos] {
            0 => StaticCompression::Uncompressed,
            end => StaticCompression::Compressed { end },
        },
    }
}

/// Read (and if needed decompress) the ARM9 static region.
pub fn load_static_region<R: Read + Seek>(
    rom: &mut R,
    arm9: &Arm9Descriptor,
) -> Result<CodeBuffer, RegionError> {
    let stored =
        read_exact_at(rom, "ARM9 static region", arm9.code_offset as u64, arm9.size as u64)?;
    let bytes = match static_compression(&stored, arm9) {
        StaticCompression::Compressed { end } => {
            log::debug!("static region compressed up to {end:#010x}");
            decompress_static(&stored, arm9.ram_start, end)?
        }
        StaticCompression::Uncompressed => stored,
        StaticCompression::Unknown => {
            log::debug!("module parameters not found; scanning static region as stored");
            stored
        }
    };
    Ok(CodeBuffer::new(STATIC_REGION_LABEL, arm9.ram_start, bytes))
}

/// Read, decompress, and optionally truncate one overlay.
pub fn load_overlay<R: Read + Seek>(
    rom: &mut R,
    overlay: &OverlayEntry,
    fat: &[FatEntry],
    truncate_at_sinit: bool,
) -> Result<CodeBuffer, RegionError> {
    let file = fat.get(overlay.file_id as usize).ok_or(RegionError::FileIdOutOfRange {
        file_id: overlay.file_id,
        fat_len: fat.len(),
    })?;
    if file.end < file.start {
        return Err(RegionError::InvertedFileRange {
            file_id: overlay.file_id,
            start: file.start,
            end: file.end,
        });
    }
    if !overlay.sinit_in_range() {
        return Err(RegionError::SinitBeforeLoad {
            sinit_start: overlay.sinit_start,
            ram_start: overlay.ram_start,
        });
    }

    let stored = read_exact_at(rom, "overlay file", file.start as u64, file.len() as u64)?;
    let mut bytes = if overlay.is_compressed() { decompress(&stored)? } else { stored };

    // The guard always ends before the static initializers.
    if truncate_at_sinit {
        if let Some(offset) = overlay.sinit_offset() {
            bytes.truncate(offset);
        }
    }
    Ok(CodeBuffer::new(format!("overlay {}", overlay.id), overlay.ram_start, bytes))
}

/// Orchestrates one pass over a ROM.
pub struct DetectionPipeline<'a> {
    pub db: &'a SignatureDb,
    pub options: &'a ScanOptions,
}

impl<'a> DetectionPipeline<'a> {
    pub fn run<R: Read + Seek>(&self, rom: &mut R) -> Result<ScanReport, ScanError> {
        if self.options.validate_rom {
            validate(rom)?;
        }

        let info = read_rom_info(rom)?;
        if is_unsupported_title(&info.game_code) {
            log::info!("[{}] uses unsupported code compression; skipping scan", info.game_code);
            let notice = UNSUPPORTED_NOTICE.iter().map(|line| line.to_string()).collect();
            return Ok(ScanReport { rom: info, outcome: ScanOutcome::Unsupported { notice } });
        }

        let arm9 = read_arm9_descriptor(rom)?;
        let fat = read_fat(rom)?;
        let overlays = read_overlay_table(rom)?;
        log::debug!("{} FAT entries, {} ARM9 overlays", fat.len(), overlays.len());

        let classifier = Classifier::new(self.db, self.options);
        let mut detections = Vec::new();
        let mut warnings = Vec::new();

        let static_result =
            load_static_region(rom, &arm9).and_then(|region| self.classify(&classifier, &region));
        match static_result {
            Ok(found) => detections.extend(found),
            Err(e) => {
                log::debug!("Failed to analyze ARM9 static region: {e}");
                warnings.push(format!("Failed to analyze ARM9 static region: {e}"));
            }
        }

        for overlay in &overlays {
            let result = load_overlay(rom, overlay, &fat, self.options.truncate_at_sinit)
                .and_then(|region| self.classify(&classifier, &region));
            match result {
                Ok(found) => detections.extend(found),
                Err(e) => {
                    log::debug!("Failed to analyze overlay {}: {e}", overlay.id);
                    warnings.push(format!("Failed to analyze overlay {}: {e}", overlay.id));
                }
            }
        }

        Ok(ScanReport { rom: info, outcome: ScanOutcome::Scanned { detections, warnings } })
    }

    fn classify(
        &self,
        classifier: &Classifier<'_>,
        region: &CodeBuffer,
    ) -> Result<Vec<DetectionResult>, RegionError> {
        log::debug!(
            "scanning {} ({:#x} bytes @ {:#010x})",
            region.label,
            region.bytes.len(),
            region.ram_start
        );
        Ok(classifier.classify_region(region)?)
    }
}

/// Scan `rom` with the built-in signature tables.
pub fn scan_rom<R: Read + Seek>(
    rom: &mut R,
    options: &ScanOptions,
) -> Result<ScanReport, ScanError> {
    let db = SignatureDb::builtin();
    DetectionPipeline { db: &db, options }.run(rom)
}

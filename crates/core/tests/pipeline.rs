mod support;

use std::io::Cursor;

use dsprot_core::rom::{read_fat, ContainerError};
use dsprot_core::services::pipeline::{
    static_compression, DetectionPipeline, StaticCompression, UNSUPPORTED_NOTICE,
};
use dsprot_core::signatures::SignatureDb;
use dsprot_core::{scan_rom, ScanError, ScanOptions, ScanOutcome, Strategy};
use support::{
    guard_words, identifying, nops, static_region, words_to_bytes, OverlayFixture, RomBuilder,
    ARM9_RAM_START,
};

const OVERLAY_RAM: u32 = 0x0219_0000;

fn no_validation() -> ScanOptions {
    ScanOptions { validate_rom: false, ..ScanOptions::default() }
}

/// Guard followed by filler code, as it sits at the top of an overlay.
fn guarded_overlay_code(label: &str, stripped: &[usize]) -> (Vec<u8>, usize) {
    let (mut words, prologue) = guard_words(label, stripped);
    words.extend(nops(128));
    (words_to_bytes(&words), prologue)
}

#[test]
fn compressed_overlay_guard_is_identified() {
    let (code, prologue) = guarded_overlay_code("1.05", &[]);
    let sinit = code.len() as u32;
    let rom = RomBuilder::new()
        .overlay(OverlayFixture::new(0, 0x0210_0000, words_to_bytes(&nops(64))))
        .overlay(OverlayFixture::new(7, OVERLAY_RAM, code).compressed().with_sinit_at(sinit))
        .build();

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).expect("scan");
    assert_eq!(report.rom.game_code, "ADTE");
    assert!(report.warnings().is_empty(), "{:?}", report.warnings());

    let detections = report.detections();
    assert_eq!(detections.len(), 1);
    let hit = &detections[0];
    assert_eq!(hit.region, "overlay 7");
    assert_eq!(hit.version_label(), "1.05");
    assert_eq!(hit.strategy, Strategy::DirectSignature);
    assert_eq!(hit.address, Some(OVERLAY_RAM + 4 * prologue as u32));
    assert_eq!(hit.deadstripped, Some(vec![]));
}

#[test]
fn stripped_exports_surface_in_report() {
    let (code, _) = guarded_overlay_code("1.20", &[2, 5]);
    let rom = RomBuilder::new()
        .overlay(OverlayFixture::new(3, OVERLAY_RAM, code).compressed())
        .build();

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).unwrap();
    assert_eq!(report.detections()[0].deadstripped_functions(), [2, 5]);
}

#[test]
fn unsupported_title_short_circuits_before_tables() {
    // Only the title and game code exist; any table read would fail.
    let mut header = b"GOLDENSUN_DD".to_vec();
    header.extend_from_slice(b"BO5E");

    let report = scan_rom(&mut Cursor::new(header), &no_validation()).expect("notice");
    assert_eq!(report.rom.game_code, "BO5E");
    match &report.outcome {
        ScanOutcome::Unsupported { notice } => assert_eq!(notice, &UNSUPPORTED_NOTICE),
        other => panic!("expected notice, got {other:?}"),
    }
    assert!(!report.detected());
}

#[test]
fn malformed_overlay_table_aborts_the_scan() {
    let mut rom = RomBuilder::new()
        .overlay(OverlayFixture::new(0, OVERLAY_RAM, words_to_bytes(&nops(16))))
        .build();
    rom[0x50..0x54].copy_from_slice(&0x00FF_0000u32.to_le_bytes());

    let err = scan_rom(&mut Cursor::new(rom), &no_validation()).unwrap_err();
    assert!(matches!(err, ScanError::Container(ContainerError::Malformed { .. })), "{err}");
}

#[test]
fn broken_overlays_become_warnings() {
    let (code, _) = guarded_overlay_code("1.26", &[]);
    let rom = RomBuilder::new()
        .overlay(OverlayFixture::new(1, 0x0210_0000, vec![0; 16]).with_file_id(99))
        .overlay(OverlayFixture::new(2, 0x0210_0000, vec![0xAB; 6]))
        .overlay(OverlayFixture::new(3, OVERLAY_RAM, code).compressed())
        .build();

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).expect("scan");
    let warnings = report.warnings();
    assert_eq!(warnings.len(), 2, "{warnings:?}");
    assert!(warnings[0].starts_with("Failed to analyze overlay 1: "), "{}", warnings[0]);
    assert!(warnings[0].contains("99"));
    assert!(warnings[1].starts_with("Failed to analyze overlay 2: "), "{}", warnings[1]);

    assert_eq!(report.detections().len(), 1);
    assert_eq!(report.detections()[0].version_label(), "1.26");
}

/// Set the first flag byte of a stored module so it opens with a back-reference.
fn corrupt_first_flag(rom: &mut [u8], file_end: usize) {
    let padding = rom[file_end - 5] as usize;
    rom[file_end - padding - 1] = 0x80;
}

#[test]
fn undecodable_overlays_do_not_stop_their_siblings() {
    let (code, _) = guarded_overlay_code("1.26", &[]);
    let mut rom = RomBuilder::new()
        .overlay(OverlayFixture::new(5, 0x0210_0000, words_to_bytes(&nops(256))).compressed())
        .overlay(OverlayFixture::new(6, OVERLAY_RAM, code).compressed())
        .overlay(OverlayFixture::new(7, 0x0220_0000, words_to_bytes(&nops(16))))
        .build();

    let fat = read_fat(&mut Cursor::new(&rom)).expect("fat");
    corrupt_first_flag(&mut rom, fat[0].end as usize);
    // Overlay 7's file ends before it starts.
    let fat_offset = u32::from_le_bytes(rom[0x48..0x4C].try_into().unwrap()) as usize;
    let inverted_end = fat[2].start - 4;
    rom[fat_offset + 2 * 8 + 4..fat_offset + 3 * 8].copy_from_slice(&inverted_end.to_le_bytes());

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).expect("scan");
    let warnings = report.warnings();
    assert_eq!(warnings.len(), 2, "{warnings:?}");
    assert!(
        warnings[0].starts_with("Failed to analyze overlay 5: back-reference"),
        "{}",
        warnings[0]
    );
    assert!(warnings[1].starts_with("Failed to analyze overlay 7: file 2 ends"), "{}", warnings[1]);

    assert_eq!(report.detections().len(), 1);
    assert_eq!(report.detections()[0].region, "overlay 6");
    assert_eq!(report.detections()[0].version_label(), "1.26");
}

#[test]
fn bad_static_compressed_end_is_isolated() {
    let mut arm9 = static_region(&nops(256), true);
    // `compressed_static_end` sits 13 words into the region; point it into the crt0 head.
    arm9[52..56].copy_from_slice(&(ARM9_RAM_START + 0x40).to_le_bytes());
    let (code, _) = guarded_overlay_code("1.22", &[]);
    let rom = RomBuilder::new()
        .arm9(arm9)
        .overlay(OverlayFixture::new(0, OVERLAY_RAM, code).compressed())
        .build();

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).expect("scan");
    assert_eq!(report.warnings().len(), 1);
    assert!(
        report.warnings()[0].starts_with("Failed to analyze ARM9 static region: inconsistent footer"),
        "{}",
        report.warnings()[0]
    );
    assert_eq!(report.detections()[0].version_label(), "1.22");
}

#[test]
fn sinit_before_load_address_is_isolated() {
    let rom = RomBuilder::new()
        .overlay(OverlayFixture {
            sinit_start: OVERLAY_RAM - 4,
            ..OverlayFixture::new(4, OVERLAY_RAM, words_to_bytes(&nops(16)))
        })
        .build();

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).unwrap();
    assert_eq!(report.warnings().len(), 1);
    assert!(report.warnings()[0].contains("precedes load address"));
}

#[test]
fn truncation_does_not_change_a_guard_before_sinit() {
    let (code, _) = guarded_overlay_code("1.28", &[]);
    let sinit = code.len() as u32 - 64;
    let rom = RomBuilder::new()
        .overlay(OverlayFixture::new(5, OVERLAY_RAM, code).compressed().with_sinit_at(sinit))
        .build();

    let truncated = scan_rom(&mut Cursor::new(rom.clone()), &no_validation()).unwrap();
    let whole = ScanOptions { truncate_at_sinit: false, ..no_validation() };
    let untruncated = scan_rom(&mut Cursor::new(rom), &whole).unwrap();
    assert_eq!(truncated.detections(), untruncated.detections());
    assert_eq!(truncated.detections()[0].version_label(), "1.28");
}

#[test]
fn bytes_past_sinit_are_ignored_when_truncating() {
    // Signature placed inside the static-initializer region.
    let mut words = nops(64);
    let sinit = (words.len() * 4) as u32;
    words.extend_from_slice(&identifying("2.00"));
    words.extend(nops(16));
    let rom = RomBuilder::new()
        .overlay(
            OverlayFixture::new(6, OVERLAY_RAM, words_to_bytes(&words))
                .compressed()
                .with_sinit_at(sinit),
        )
        .build();

    let truncated = scan_rom(&mut Cursor::new(rom.clone()), &no_validation()).unwrap();
    assert!(!truncated.detected());

    let whole = ScanOptions { truncate_at_sinit: false, ..no_validation() };
    let untruncated = scan_rom(&mut Cursor::new(rom), &whole).unwrap();
    assert_eq!(untruncated.detections()[0].version_label(), "2.00");
}

#[test]
fn compressed_static_region_is_scanned() {
    let (mut body, prologue) = guard_words("2.01 Instant", &[]);
    body.extend(nops(64));
    let arm9 = static_region(&body, true);
    let rom = RomBuilder::new().arm9(arm9).build();

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).expect("scan");
    assert!(report.warnings().is_empty(), "{:?}", report.warnings());
    let hit = &report.detections()[0];
    assert_eq!(hit.region, "static region");
    assert_eq!(hit.version_label(), "2.01 Instant");
    // 24 words of crt0 head precede the decompressed body.
    assert_eq!(hit.address, Some(ARM9_RAM_START + 4 * (24 + prologue as u32)));
}

#[test]
fn module_parameters_report_static_compression() {
    let body = nops(128);
    let arm9 = dsprot_core::rom::Arm9Descriptor {
        code_offset: 0x200,
        entry_point: ARM9_RAM_START,
        ram_start: ARM9_RAM_START,
        size: 0,
    };

    let plain = static_region(&body, false);
    assert_eq!(static_compression(&plain, &arm9), StaticCompression::Uncompressed);

    let packed = static_region(&body, true);
    assert!(matches!(
        static_compression(&packed, &arm9),
        StaticCompression::Compressed { end } if end > ARM9_RAM_START
    ));

    assert_eq!(static_compression(&words_to_bytes(&body), &arm9), StaticCompression::Unknown);
}

#[test]
fn uncompressed_static_region_without_params_is_scanned_as_stored() {
    let (mut body, _) = guard_words("1.23", &[]);
    body.extend(nops(8));
    let rom = RomBuilder::new().arm9(words_to_bytes(&body)).build();

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).unwrap();
    assert_eq!(report.detections()[0].version_label(), "1.23");
}

#[test]
fn clean_rom_reports_nothing() {
    let rom = RomBuilder::new()
        .arm9(static_region(&nops(256), true))
        .overlay(OverlayFixture::new(0, OVERLAY_RAM, words_to_bytes(&nops(256))).compressed())
        .build();

    let report = scan_rom(&mut Cursor::new(rom), &no_validation()).unwrap();
    assert!(!report.detected());
    assert!(report.warnings().is_empty());
    assert!(matches!(report.outcome, ScanOutcome::Scanned { .. }));
}

#[test]
fn validation_gates_the_scan() {
    let (code, _) = guarded_overlay_code("1.10", &[]);
    let builder = RomBuilder::new().overlay(OverlayFixture::new(0, OVERLAY_RAM, code).compressed());

    let err = scan_rom(&mut Cursor::new(builder.build()), &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, ScanError::Container(ContainerError::InvalidRom(_))));

    let report =
        scan_rom(&mut Cursor::new(builder.full_size().build()), &ScanOptions::default()).unwrap();
    assert_eq!(report.detections()[0].version_label(), "1.10");
}

#[test]
fn custom_database_drives_the_pipeline() {
    let (code, _) = guarded_overlay_code("1.25", &[]);
    let rom = RomBuilder::new().overlay(OverlayFixture::new(0, OVERLAY_RAM, code)).build();
    let db = SignatureDb::default();
    let options = no_validation();

    let report = DetectionPipeline { db: &db, options: &options }.run(&mut Cursor::new(rom)).unwrap();
    assert!(!report.detected());
}

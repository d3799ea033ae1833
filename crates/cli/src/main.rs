use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dsprot_core::services::pipeline::DetectionPipeline;
use dsprot_core::ScanOptions;
use dsprot_scan::{load_signature_db, render_report, sha256_file, ScanDocument};

/// Detect the DS Protect anti-piracy guard in a Nintendo DS ROM.
///
/// This CLI is a thin wrapper around `dsprot-core`; all detection logic lives
/// in the library so it can be tested directly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(name = "dsprot-scan", version, about = "Detect DS Protect in Nintendo DS ROMs", long_about = None)]
struct Cli {
    /// Path to the `.nds` cartridge image.
    rom: PathBuf,

    /// Emit the scan report as JSON instead of human-readable text.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Skip the ROM size and logo sanity check.
    #[arg(long, default_value_t = false)]
    no_validate: bool,

    /// Scan overlays past the start of their static initializers.
    #[arg(long, default_value_t = false)]
    no_truncate: bool,

    /// JSON signature database merged over the built-in tables.
    #[arg(long, value_name = "FILE")]
    signatures: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));
    let cli = Cli::parse();

    let db = load_signature_db(cli.signatures.as_deref())?;
    let options = ScanOptions {
        validate_rom: !cli.no_validate,
        truncate_at_sinit: !cli.no_truncate,
        ..ScanOptions::default()
    };

    let file = File::open(&cli.rom)
        .with_context(|| format!("Failed to open ROM: {}", cli.rom.display()))?;
    let mut reader = BufReader::new(file);
    let report = DetectionPipeline { db: &db, options: &options }
        .run(&mut reader)
        .with_context(|| format!("Failed to scan {}", cli.rom.display()))?;
    log::info!("{}: {} detection(s)", cli.rom.display(), report.detections().len());

    if cli.json {
        let sha256 = sha256_file(&cli.rom)?;
        let document = ScanDocument::new(&cli.rom, sha256, &report);
        let serialized =
            serde_json::to_string_pretty(&document).context("Failed to serialize scan report")?;
        println!("{serialized}");
    } else {
        print!("{}", render_report(&report));
    }

    Ok(())
}

use std::fmt::Write as _;
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use dsprot_core::signatures::SignatureDb;
use dsprot_core::{DetectionResult, ScanOutcome, ScanReport};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open ROM for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read ROM for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Built-in signature tables, extended by `extra` when given.
pub fn load_signature_db(extra: Option<&Path>) -> Result<SignatureDb> {
    match extra {
        Some(path) => SignatureDb::builtin_with(path)
            .with_context(|| format!("Failed to load signature database {}", path.display())),
        None => Ok(SignatureDb::builtin()),
    }
}

/// JSON document emitted by `--json`.
#[derive(Debug, Serialize)]
pub struct ScanDocument<'a> {
    pub path: String,
    pub sha256: String,
    /// RFC 3339 time the scan finished.
    pub scanned_at: String,
    #[serde(flatten)]
    pub report: &'a ScanReport,
}

impl<'a> ScanDocument<'a> {
    pub fn new(path: &Path, sha256: String, report: &'a ScanReport) -> Self {
        Self {
            path: path.display().to_string(),
            sha256,
            scanned_at: Utc::now().to_rfc3339(),
            report,
        }
    }
}

/// Human-readable report, one block per detection.
pub fn render_report(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Game: [{}] {}", report.rom.game_code, report.rom.title);

    match &report.outcome {
        ScanOutcome::Unsupported { notice } => {
            out.push('\n');
            for line in notice {
                let _ = writeln!(out, "{line}");
            }
        }
        ScanOutcome::Scanned { detections, warnings } => {
            for warning in warnings {
                let _ = writeln!(out, "WARNING: {warning}");
            }
            for detection in detections {
                out.push('\n');
                out.push_str(&render_detection(detection));
            }
            if detections.is_empty() {
                out.push_str("\nDS Protect not detected\n");
            }
        }
    }
    out
}

fn render_detection(detection: &DetectionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DS Protect found @ {}", detection.region);
    let _ = writeln!(out, "Version: {}", detection.version_label());
    if let Some(address) = detection.address {
        let _ = writeln!(out, "Address: {address:08X}");
    }
    let stripped = detection.deadstripped_functions();
    if !stripped.is_empty() {
        let list: Vec<String> = stripped.iter().map(|i| i.to_string()).collect();
        let _ = writeln!(out, "Deadstripped: {}", list.join(", "));
    }
    out
}

//! Core data model shared by the reader, classifier, and pipeline.
//!
//! Everything a frontend renders lives here:
//! - `VersionId` labels for known DS Protect builds
//! - `DetectionResult` records, one per identified region/version
//! - `ScanReport` aggregating a whole ROM pass
//! - `ScanOptions` controlling optional pipeline behavior

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rom::RomInfo;

/// Label of a known DS Protect release (e.g. `1.23z`, `2.01 Instant`).
///
/// "Instant" builds are a variant distinguished only by trailing signature words.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub String);

impl VersionId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionId {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// Which classifier strategy produced a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Full identifying signature found verbatim.
    DirectSignature,
    /// Six-word tag preceding the guard's telemetry data.
    GarbageTag,
    /// Set of exported encryption keys.
    KeySet,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::DirectSignature => "direct-signature",
            Strategy::GarbageTag => "garbage-tag",
            Strategy::KeySet => "key-set",
        }
    }
}

/// One positive identification inside one code region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Human label of the region, e.g. `static region` or `overlay 12`.
    pub region: String,
    /// Resolved build, `None` when the guard is present but its build is unknown.
    pub version: Option<VersionId>,
    pub strategy: Strategy,
    /// Load address of the guard, when it could be recovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<u32>,
    /// 1-based indices of exported functions removed by the linker.
    ///
    /// `None` when the build has no proof table to check against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadstripped: Option<Vec<usize>>,
}

impl DetectionResult {
    /// Deadstripped function indices, empty when none or unknown.
    pub fn deadstripped_functions(&self) -> &[usize] {
        self.deadstripped.as_deref().unwrap_or(&[])
    }

    /// Version label suitable for display (`unknown` when unresolved).
    pub fn version_label(&self) -> &str {
        self.version.as_ref().map(VersionId::as_str).unwrap_or("unknown")
    }
}

/// Final outcome of a ROM pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Analysis was skipped for a title that cannot be scanned; carries a fixed notice.
    Unsupported { notice: Vec<String> },
    /// Regular scan over the static region and all overlays.
    Scanned { detections: Vec<DetectionResult>, warnings: Vec<String> },
}

/// Aggregated result for one ROM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub rom: RomInfo,
    #[serde(flatten)]
    pub outcome: ScanOutcome,
}

impl ScanReport {
    /// True when at least one region produced a detection.
    pub fn detected(&self) -> bool {
        !self.detections().is_empty()
    }

    pub fn detections(&self) -> &[DetectionResult] {
        match &self.outcome {
            ScanOutcome::Scanned { detections, .. } => detections,
            ScanOutcome::Unsupported { .. } => &[],
        }
    }

    pub fn warnings(&self) -> &[String] {
        match &self.outcome {
            ScanOutcome::Scanned { warnings, .. } => warnings,
            ScanOutcome::Unsupported { .. } => &[],
        }
    }
}

/// Options controlling optional pipeline behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Run the size/logo sanity check before reading any tables.
    pub validate_rom: bool,
    /// Drop overlay bytes from the static-initializer region onward.
    pub truncate_at_sinit: bool,
    /// How many words before the MAC marker the key-set fallback inspects.
    pub key_scan_window: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { validate_rom: true, truncate_at_sinit: true, key_scan_window: 0x4000 }
    }
}

/// Decompressed bytes of one code region, tagged with its load address.
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    pub label: String,
    pub ram_start: u32,
    pub bytes: Vec<u8>,
}

impl CodeBuffer {
    pub fn new(label: impl Into<String>, ram_start: u32, bytes: Vec<u8>) -> Self {
        Self { label: label.into(), ram_start, bytes }
    }
}

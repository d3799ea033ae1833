//! dsprot-core
//!
//! Core library for locating DS Protect inside Nintendo DS cartridge images.
//!
//! This crate defines the shared data model, the cartridge container reader,
//! the backward LZSS codec used for compressed code modules, the signature
//! scanner with its reference tables, and the detection services built on top.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends (CLI, batch auditing scripts, etc.).

pub mod model;
pub mod rom;
pub mod compression;
pub mod signatures;
pub mod services;

pub use model::{DetectionResult, ScanOptions, ScanOutcome, ScanReport, Strategy, VersionId};
pub use services::pipeline::{scan_rom, ScanError};

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

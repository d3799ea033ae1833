//! Detection services built on the reader, codec, and scanner.
//!
//! - `classifier`: strategy ladder resolving a DS Protect build inside one region
//! - `pipeline`: the per-ROM pass over the static region and every overlay

pub mod classifier;
pub mod pipeline;

pub use classifier::{Classifier, Verdict, STRATEGY_LADDER};
pub use pipeline::{DetectionPipeline, RegionError, ScanError};

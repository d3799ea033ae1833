use std::collections::BTreeSet;

use crate::model::{CodeBuffer, DetectionResult, ScanOptions, Strategy, VersionId};
use crate::signatures::{
    encryption_keys, find, find_start_word, words_from_bytes, ShapeError, Signature, SignatureDb,
    MAC_MARKER, SIGNATURE_LEN,
};

/// Strategies in the order they are tried; the first definite verdict wins.
pub const STRATEGY_LADDER: [Strategy; 3] =
    [Strategy::DirectSignature, Strategy::GarbageTag, Strategy::KeySet];

/// `BX LR`.
const BX_LR: u32 = 0xE12FFF1E;

/// Outcome of a single strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// One or more builds identified.
    Identified(Vec<VersionId>),
    /// The guard is present but its build could not be resolved.
    Unknown,
    /// This strategy has nothing to say; try the next one.
    NoVerdict,
}

/// Absolute pointer into main RAM.
pub fn is_pointer(word: u32) -> bool {
    word >> 24 == 0x02
}

/// `BX LR` or `LDMFD SP!, {..., PC}`.
pub fn is_epilogue(word: u32) -> bool {
    word == BX_LR || word & 0xFFFF_8000 == 0xE8BD_8000
}

/// Index of the MAC marker pair, if present.
pub fn find_mac_marker(words: &[u32]) -> Option<usize> {
    find(words, &MAC_MARKER)
}

/// Six-word tag candidate in front of the marker at `marker`.
///
/// Walks backward over the guard's data, stopping at a function epilogue or a
/// double-zero terminator. The six words following the stop point are the
/// candidate; they must end before the marker and contain no pointer or epilogue.
pub fn garbage_tag_candidate(words: &[u32], marker: usize) -> Option<Signature> {
    let mut idx = marker.min(words.len());
    let stop = loop {
        if idx == 0 {
            return None;
        }
        idx -= 1;
        let word = words[idx];
        if is_pointer(word) {
            continue;
        }
        if is_epilogue(word) || (word == 0 && idx > 0 && words[idx - 1] == 0) {
            break idx;
        }
    };

    let start = stop + 1;
    let end = start + SIGNATURE_LEN;
    if end > marker {
        return None;
    }
    let tag = &words[start..end];
    if tag.iter().any(|&w| is_pointer(w) || is_epilogue(w)) {
        return None;
    }
    tag.try_into().ok()
}

/// Smallest canonical key set containing every collected key (ties: table order).
pub fn resolve_keys(db: &SignatureDb, keys: &BTreeSet<u16>) -> Option<VersionId> {
    if keys.is_empty() {
        return None;
    }
    db.key_sets()
        .into_iter()
        .filter(|(_, set)| set.is_superset(keys))
        .min_by_key(|(_, set)| set.len())
        .map(|(version, _)| version.clone())
}

/// Identifies DS Protect builds inside decompressed code regions.
pub struct Classifier<'a> {
    pub db: &'a SignatureDb,
    pub key_scan_window: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(db: &'a SignatureDb, options: &ScanOptions) -> Self {
        Self { db, key_scan_window: options.key_scan_window }
    }

    /// Convert a region to words and classify it.
    pub fn classify_region(&self, region: &CodeBuffer) -> Result<Vec<DetectionResult>, ShapeError> {
        let words = words_from_bytes(&region.bytes)?;
        Ok(self.classify(&region.label, region.ram_start, &words))
    }

    /// Run the strategy ladder over `words`. Never fails; an empty result means
    /// no trace of the guard.
    pub fn classify(&self, label: &str, ram_start: u32, words: &[u32]) -> Vec<DetectionResult> {
        for strategy in STRATEGY_LADDER {
            match self.run_strategy(strategy, words) {
                Verdict::NoVerdict => continue,
                Verdict::Unknown => {
                    log::debug!("{label}: guard present, build unresolved ({})", strategy.as_str());
                    return vec![DetectionResult {
                        region: label.to_string(),
                        version: None,
                        strategy,
                        address: None,
                        deadstripped: None,
                    }];
                }
                Verdict::Identified(versions) => {
                    return versions
                        .into_iter()
                        .map(|version| {
                            log::debug!("{label}: {version} via {}", strategy.as_str());
                            DetectionResult {
                                region: label.to_string(),
                                address: self.recover_address(&version, words, ram_start),
                                deadstripped: self.deadstripped(&version, words),
                                version: Some(version),
                                strategy,
                            }
                        })
                        .collect();
                }
            }
        }
        Vec::new()
    }

    pub fn run_strategy(&self, strategy: Strategy, words: &[u32]) -> Verdict {
        match strategy {
            Strategy::DirectSignature => self.direct_signature(words),
            Strategy::GarbageTag => self.garbage_tag(words),
            Strategy::KeySet => self.key_set(words),
        }
    }

    fn direct_signature(&self, words: &[u32]) -> Verdict {
        let found: Vec<VersionId> = self
            .db
            .versions
            .iter()
            .filter(|v| v.identifying.map_or(false, |sig| find(words, &sig).is_some()))
            .map(|v| v.version.clone())
            .collect();
        if found.is_empty() {
            Verdict::NoVerdict
        } else {
            Verdict::Identified(found)
        }
    }

    fn garbage_tag(&self, words: &[u32]) -> Verdict {
        let Some(candidate) = find_mac_marker(words).and_then(|m| garbage_tag_candidate(words, m))
        else {
            return Verdict::NoVerdict;
        };
        match self.db.garbage_tags.iter().find(|t| t.tag == candidate) {
            Some(tag) => Verdict::Identified(vec![tag.version.clone()]),
            None => Verdict::NoVerdict,
        }
    }

    fn key_set(&self, words: &[u32]) -> Verdict {
        let Some(marker) = find_mac_marker(words) else {
            return Verdict::NoVerdict;
        };
        let window = &words[marker.saturating_sub(self.key_scan_window)..marker];
        let keys: BTreeSet<u16> = encryption_keys(window).into_iter().collect();
        match resolve_keys(self.db, &keys) {
            Some(version) => Verdict::Identified(vec![version]),
            None => Verdict::Unknown,
        }
    }

    /// 1-based indices of exported functions whose proof signature is missing.
    ///
    /// `None` when the build has no proof table.
    pub fn deadstripped(&self, version: &VersionId, words: &[u32]) -> Option<Vec<usize>> {
        let proofs = self.db.get(version)?.deadstrip_proofs.as_ref()?;
        Some(
            proofs
                .iter()
                .enumerate()
                .filter(|(_, proof)| find(words, &proof[..]).is_none())
                .map(|(i, _)| i + 1)
                .collect(),
        )
    }

    /// Load address of the guard: locate the build's start anchor, then walk back
    /// to its prologue word. Best effort.
    pub fn recover_address(&self, version: &VersionId, words: &[u32], ram_start: u32) -> Option<u32> {
        let start = self.db.get(version)?.start.as_ref()?;
        let anchor = find(words, &start.signature)?;
        let idx = find_start_word(words, anchor, start.start_word)?;
        Some(ram_start.wrapping_add((idx as u32).wrapping_mul(4)))
    }
}

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tables::{DEADSTRIP_PROOFS, GARBAGE_TAGS, IDENTIFYING, STARTS};
use super::{encryption_keys, Signature};
use crate::model::VersionId;

/// Anchor near the top of the guard plus the prologue word that begins it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSignature {
    pub signature: Signature,
    pub start_word: u32,
}

/// Everything known about one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSignatures {
    pub version: VersionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifying: Option<Signature>,
    /// One signature per exported function, in export order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadstrip_proofs: Option<Vec<Signature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<StartSignature>,
}

impl VersionSignatures {
    /// Encryption keys embedded in this build's reference signatures.
    ///
    /// Derived with the same branch/call pairing the key-set fallback scans for,
    /// so a deadstripped binary can only ever expose a subset of these.
    pub fn canonical_keys(&self) -> BTreeSet<u16> {
        let mut keys: BTreeSet<u16> = BTreeSet::new();
        if let Some(sig) = &self.identifying {
            keys.extend(encryption_keys(sig));
        }
        for proof in self.deadstrip_proofs.iter().flatten() {
            keys.extend(encryption_keys(proof));
        }
        keys
    }
}

/// Six-word tag that precedes the guard's telemetry data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GarbageTag {
    pub version: VersionId,
    pub tag: Signature,
}

#[derive(Debug, Error)]
pub enum SignatureDbError {
    #[error("Failed to read signature database {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("Invalid signature database: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reference data consulted by the classifier.
///
/// Version order matters: it is the order detections are reported in and the
/// tie-break order of the key-set fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureDb {
    pub versions: Vec<VersionSignatures>,
    pub garbage_tags: Vec<GarbageTag>,
}

impl SignatureDb {
    /// Database populated from the compiled-in tables.
    pub fn builtin() -> Self {
        let versions = IDENTIFYING
            .iter()
            .map(|(label, identifying)| VersionSignatures {
                version: VersionId::new(*label),
                identifying: Some(*identifying),
                deadstrip_proofs: DEADSTRIP_PROOFS
                    .iter()
                    .find(|(l, _)| l == label)
                    .map(|(_, proofs)| proofs.to_vec()),
                start: STARTS.iter().find(|(l, _, _)| l == label).map(|(_, signature, word)| {
                    StartSignature { signature: *signature, start_word: *word }
                }),
            })
            .collect();
        let garbage_tags = GARBAGE_TAGS
            .iter()
            .map(|(label, tag)| GarbageTag { version: VersionId::new(*label), tag: *tag })
            .collect();
        Self { versions, garbage_tags }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SignatureDbError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SignatureDbError> {
        let json = fs::read_to_string(path)
            .map_err(|source| SignatureDbError::Io { path: path.display().to_string(), source })?;
        Self::from_json_str(&json)
    }

    /// Built-in tables extended by the database at `path`.
    pub fn builtin_with(path: &Path) -> Result<Self, SignatureDbError> {
        let mut db = Self::builtin();
        db.merge(Self::load(path)?);
        Ok(db)
    }

    /// Overlay `other` onto this database.
    ///
    /// Versions with a matching label replace the existing entry in place; new
    /// versions are appended. Garbage tags are appended unless already present.
    pub fn merge(&mut self, other: SignatureDb) {
        for entry in other.versions {
            match self.versions.iter_mut().find(|v| v.version == entry.version) {
                Some(existing) => *existing = entry,
                None => self.versions.push(entry),
            }
        }
        for tag in other.garbage_tags {
            if !self.garbage_tags.contains(&tag) {
                self.garbage_tags.push(tag);
            }
        }
    }

    pub fn get(&self, version: &VersionId) -> Option<&VersionSignatures> {
        self.versions.iter().find(|v| &v.version == version)
    }

    /// Non-empty canonical key sets, in version order.
    pub fn key_sets(&self) -> Vec<(&VersionId, BTreeSet<u16>)> {
        self.versions
            .iter()
            .map(|v| (&v.version, v.canonical_keys()))
            .filter(|(_, keys)| !keys.is_empty())
            .collect()
    }
}

//! Snapshot persistence for the ledger and transfer history
//!
//! The ledger map and transfer history are written as one pretty-printed JSON
//! document with a SHA-256 checksum over the serialized state. Writes go to a
//! temporary file that is fsynced and renamed over the target, so a crash
//! leaves either the previous snapshot or the new one.
//!
//! Failures here are never fatal to the engine; callers log and carry on.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use types::ids::PlatformId;
use types::metrics::PlatformMetrics;
use types::transfer::TransferRecord;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

// ── State ───────────────────────────────────────────────────────────

/// Everything that survives a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub platforms: BTreeMap<PlatformId, PlatformMetrics>,
    /// Newest first
    pub transfers: Vec<TransferRecord>,
}

impl PersistedState {
    /// SHA-256 over the canonical JSON encoding (BTreeMap keeps key order stable).
    pub fn compute_hash(&self) -> Result<String, PersistenceError> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: PersistedState,
    pub checksum: String,
}

impl Snapshot {
    pub fn new(state: PersistedState, saved_at: DateTime<Utc>) -> Result<Self, PersistenceError> {
        let checksum = state.compute_hash()?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            state,
            checksum,
        })
    }
}

// ── Store ───────────────────────────────────────────────────────────

/// Reads and writes the snapshot file at a fixed path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a snapshot atomically: serialize → write tmp → fsync → rename.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Load the snapshot, or `None` when no file exists yet.
    pub fn load(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_slice(&data)?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(snapshot.version));
        }

        let actual = snapshot.state.compute_hash()?;
        if actual != snapshot.checksum {
            return Err(PersistenceError::IntegrityFailure {
                expected: snapshot.checksum.clone(),
                actual,
            });
        }

        Ok(Some(snapshot))
    }
}

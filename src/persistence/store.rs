//! Checkpoint stores.
//!
//! Loading never fails loudly: a missing, unreadable, malformed or
//! tampered checkpoint is reported as absent so the caller can fall
//! back to a cold start.

use super::checkpoint::{Checkpoint, CheckpointRecord};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Errors that can occur while writing a checkpoint.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing or renaming the checkpoint file failed.
    #[error("failed to write checkpoint {path}: {source}")]
    Io {
        /// Checkpoint file being written.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// JSON encoding failed.
    #[error("failed to encode checkpoint: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence for the anti-rollback checkpoint.
pub trait StateStore: Send {
    /// Loads and verifies the checkpoint. `None` if absent or corrupted.
    fn load(&self) -> Option<Checkpoint>;

    /// Replaces the stored checkpoint.
    fn save(&mut self, token: &[u8], reseed_counter: u64) -> Result<(), StoreError>;
}

/// JSON file store with whole-file replacement.
///
/// Writes go to a sibling temporary file which is then renamed over
/// the target, so readers see either the old or the new record.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Default file name.
    pub const DEFAULT_PATH: &'static str = "secure_state.json";

    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for FileStateStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATH)
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Option<Checkpoint> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No checkpoint file");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Checkpoint unreadable");
                return None;
            }
        };

        let record: CheckpointRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Checkpoint malformed");
                return None;
            }
        };

        record.verify()
    }

    fn save(&mut self, token: &[u8], reseed_counter: u64) -> Result<(), StoreError> {
        let record = CheckpointRecord::seal(token, reseed_counter);
        let encoded = serde_json::to_string_pretty(&record)?;

        let temp = self.temp_path();
        std::fs::write(&temp, encoded).map_err(|e| self.io_error(e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), reseed_counter, "Checkpoint saved");
        Ok(())
    }
}

/// In-memory store for hosts without persistent storage and for tests.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    slot: Arc<Mutex<Option<CheckpointRecord>>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the stored record.
    pub fn record(&self) -> Option<CheckpointRecord> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Overwrites the stored record verbatim, bypassing sealing.
    pub fn set_record(&self, record: Option<CheckpointRecord>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = record;
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Option<Checkpoint> {
        self.record()?.verify()
    }

    fn save(&mut self, token: &[u8], reseed_counter: u64) -> Result<(), StoreError> {
        self.set_record(Some(CheckpointRecord::seal(token, reseed_counter)));
        Ok(())
    }
}

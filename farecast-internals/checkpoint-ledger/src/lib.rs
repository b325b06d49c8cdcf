//! Farecast Checkpoint Ledger
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! farecast-internals/checkpoint-ledger
//! A whole-file checkpoint store for datasets that grow across long-running jobs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Custom error for the checkpoint ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("checkpoint (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// An append-only in-memory dataset with durable whole-file checkpoints.
///
/// The backing file holds the full dataset as a JSON array and is replaced
/// atomically on every checkpoint (write to a sibling temp file, then
/// rename), so an interrupted writer never truncates the previous
/// checkpoint.
///
/// # Examples
///
/// ```ignore
/// let mut ledger: CheckpointLedger<MyRecord> = CheckpointLedger::load("fares.json")?;
/// ledger.append(record);
/// ledger.checkpoint()?;
/// ```
#[derive(Debug)]
pub struct CheckpointLedger<T> {
    path: PathBuf,
    records: Vec<T>,
}

impl<T> CheckpointLedger<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the ledger at `path`, loading any previously checkpointed
    /// records. A missing file yields an empty ledger, not an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let records = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, records })
    }

    /// Append a record to the in-memory dataset. Not durable until the next
    /// [`checkpoint`](Self::checkpoint).
    pub fn append(&mut self, record: T) {
        self.records.push(record);
    }

    /// Rewrite the backing file with the full dataset.
    ///
    /// The write goes to `<path>.tmp` first and is renamed over the target,
    /// so the previous checkpoint survives a crash mid-write.
    pub fn checkpoint(&self) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let staging = self.staging_path();
        let bytes = serde_json::to_vec_pretty(&self.records)?;
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//! Resumable extraction checkpoints
//!
//! A checkpoint holds the cursor plus every record fetched so far, so an
//! aborted run can pick up after the last saved page instead of starting over.

use super::Cursor;
use crate::error::{ArchiveError, Result};
use crate::storage::replace_atomically;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::OsString;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Saved extraction state
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Checkpoint {
    pub search_after: Cursor,
    pub pages: usize,
    pub records: Vec<Value>,
}

#[derive(Serialize)]
struct CheckpointRef<'a> {
    search_after: &'a [Value],
    pages: usize,
    records: &'a [Value],
}

/// Location of a checkpoint file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Checkpoint kept beside a snapshot: `<snapshot>.checkpoint`
    pub fn for_snapshot(snapshot: impl AsRef<Path>) -> Self {
        let mut path = OsString::from(snapshot.as_ref().as_os_str());
        path.push(".checkpoint");
        Self::new(PathBuf::from(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint, `None` if there is none on disk
    pub fn load(&self) -> Result<Option<Checkpoint>> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ArchiveError::io(&self.path, e)),
        };

        let checkpoint = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ArchiveError::format(&self.path, format!("Unreadable checkpoint: {}", e))
        })?;
        Ok(Some(checkpoint))
    }

    /// Atomically replace the checkpoint with the given state
    pub fn save(&self, search_after: &[Value], pages: usize, records: &[Value]) -> Result<()> {
        let state = CheckpointRef {
            search_after,
            pages,
            records,
        };
        replace_atomically(&self.path, "._checkpoint_", |w| {
            serde_json::to_writer(w, &state).map_err(Into::into)
        })?;
        log::debug!(
            "Checkpoint saved to {} after page {} ({} records)",
            self.path.display(),
            pages,
            records.len()
        );
        Ok(())
    }

    /// Remove the checkpoint once the run has completed
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ArchiveError::io(&self.path, e)),
        }
    }
}

/// How often, and whether to resume from, checkpoints during a pull
#[derive(Debug, Clone)]
pub struct CheckpointPolicy {
    pub store: CheckpointStore,
    /// Save after every `every` pages
    pub every: usize,
    /// Start from an existing checkpoint when one is present
    pub resume: bool,
}

impl CheckpointPolicy {
    pub fn new(store: CheckpointStore, every: usize) -> Self {
        Self {
            store,
            every: every.max(1),
            resume: false,
        }
    }

    pub fn resuming(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub(crate) fn is_due(&self, pages: usize) -> bool {
        pages % self.every == 0
    }
}

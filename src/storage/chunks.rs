//! Chunked snapshot layout for static hosting
//!
//! A large snapshot is sliced into `chunk_{i}.json` files (compact JSON,
//! newest records first) plus a `manifest.json` describing the slicing, so a
//! browser front-end can load the archive incrementally.

use crate::error::{ArchiveError, Result};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHUNK_SIZE: usize = 5000;
pub const MANIFEST_FILE: &str = "manifest.json";

/// Description of a chunked snapshot, read by the front-end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkManifest {
    /// Records not flagged `isDeleted`
    pub total_tweets: usize,
    pub total_chunks: usize,
    pub chunk_size: usize,
    pub created_at: DateTime<Utc>,
}

/// Writes a snapshot as numbered chunk files plus a manifest
pub struct ChunkWriter {
    dir: PathBuf,
    chunk_size: usize,
}

impl ChunkWriter {
    pub fn new(dir: impl AsRef<Path>, chunk_size: usize) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("chunk_{}.json", index))
    }

    /// Sort `records` newest first, write every chunk, then the manifest
    pub fn write(&self, mut records: Vec<Value>) -> Result<ChunkManifest> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ArchiveError::io(&self.dir, e))?;

        records.sort_by(newest_first);

        let total_tweets = records.iter().filter(|r| !is_deleted(r)).count();
        let total_chunks = records.len().div_ceil(self.chunk_size);
        log::info!(
            "Splitting {} record(s) into {} chunk(s) of {}",
            records.len(),
            total_chunks,
            self.chunk_size
        );

        for (index, chunk) in records.chunks(self.chunk_size).enumerate() {
            let path = self.chunk_path(index);
            let body = serde_json::to_vec(chunk)
                .map_err(|e| ArchiveError::io(&path, e.into()))?;
            std::fs::write(&path, &body).map_err(|e| ArchiveError::io(&path, e))?;
            log::info!(
                "  Created {} ({} records, {:.1} KB)",
                path.display(),
                chunk.len(),
                body.len() as f64 / 1024.0
            );
        }

        let manifest = ChunkManifest {
            total_tweets,
            total_chunks,
            chunk_size: self.chunk_size,
            created_at: Utc::now(),
        };

        let path = self.dir.join(MANIFEST_FILE);
        let body = serde_json::to_string_pretty(&manifest)
            .map_err(|e| ArchiveError::io(&path, e.into()))?;
        std::fs::write(&path, body).map_err(|e| ArchiveError::io(&path, e))?;
        log::info!("Created {}", path.display());

        Ok(manifest)
    }
}

fn date_of(record: &Value) -> Option<f64> {
    record.get("date").and_then(Value::as_f64)
}

fn is_deleted(record: &Value) -> bool {
    record.get("isDeleted").and_then(Value::as_bool) == Some(true)
}

/// Descending by numeric `date`; undated records sink to the end
fn newest_first(a: &Value, b: &Value) -> Ordering {
    match (date_of(a), date_of(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

//! File system storage operations
//!
//! This module handles all file I/O operations including:
//! - Snapshot (JSON array) reading and writing
//! - Atomic file replacement
//! - Chunked snapshot layout with a manifest

mod chunks;
mod snapshot;

pub use chunks::{ChunkManifest, ChunkWriter, DEFAULT_CHUNK_SIZE, MANIFEST_FILE};
pub use snapshot::{SnapshotReader, SnapshotWriter, replace_atomically, write_records};

//! Archive Puller
//!
//! Pulls every record out of a search-backed tweet archive with
//! `search_after` pagination, saves it as a JSON snapshot, and cleans
//! and slices snapshots for hosting.

pub mod archive;
pub mod cleaner;
pub mod cli;
pub mod client;
pub mod error;
pub mod etl;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use archive::{ArchiveExtractor, CheckpointStore, SearchQuery};
pub use cleaner::{CleanReport, clean};
pub use client::{Auth, SearchClient, SearchConfig, SearchTransport};
pub use error::ArchiveError;
pub use etl::{Extractor, IdentityTransformer, Loader, Pipeline, Transformer};
pub use storage::{ChunkWriter, SnapshotReader, SnapshotWriter};
pub use transform::EmptyTextFilter;

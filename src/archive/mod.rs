//! Archive extraction over the multi-search endpoint
//!
//! - [`SearchQuery`]: query bodies and the archive's total sort order
//! - [`parse_page`]: response envelope decoding
//! - [`ArchiveExtractor`]: `search_after` pagination to exhaustion
//! - [`CheckpointStore`]: resumable progress for long pulls

mod checkpoint;
mod extractor;
mod query;
mod response;

pub use checkpoint::{Checkpoint, CheckpointPolicy, CheckpointStore};
pub use extractor::{ArchiveExtractor, DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE};
pub use query::{Cursor, SearchQuery, SortField, SortOrder, archive_sort};
pub use response::{Hit, parse_page};

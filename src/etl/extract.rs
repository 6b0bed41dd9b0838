//! Extractor trait for pulling records out of a source

use eyre::Result;

/// Extractor trait for extracting data from a source
///
/// Implementors define where records come from:
/// - The remote archive ([`crate::archive::ArchiveExtractor`])
/// - A snapshot on disk ([`crate::storage::SnapshotReader`])
///
/// # Example
/// ```no_run
/// use archive_puller::etl::Extractor;
/// use eyre::Result;
/// use serde_json::{Value, json};
///
/// struct FixedExtractor;
///
/// impl Extractor for FixedExtractor {
///     type Item = Value;
///
///     async fn extract(&self) -> Result<Vec<Self::Item>> {
///         Ok(vec![json!({"id": "1", "text": "hello"})])
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of items extracted
    type Item: Send;

    /// Extract every item from the source, in source order
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, I/O, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Vec<Self::Item>>> + Send;
}

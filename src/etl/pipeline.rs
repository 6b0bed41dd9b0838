//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::Result;

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Item)
/// - `L`: Loader type (must load T::Output)
///
/// # Example
/// ```no_run
/// use archive_puller::archive::ArchiveExtractor;
/// use archive_puller::client::{Auth, SearchClient, SearchConfig};
/// use archive_puller::etl::{IdentityTransformer, Pipeline};
/// use archive_puller::storage::SnapshotWriter;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("http://localhost:9200/trump_tweets/_msearch")?;
/// let client = SearchClient::try_new(SearchConfig::new(url, Auth::None))?;
///
/// let pipeline = Pipeline::new(
///     ArchiveExtractor::new(client),
///     IdentityTransformer::new(),
///     SnapshotWriter::atomic("trump_tweets.json"),
/// );
///
/// let count = pipeline.run().await?;
/// println!("Saved {} records", count);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Item>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract items from source
    /// 2. Transform (and possibly drop) each item
    /// 3. Load the survivors to the destination, even when there are none,
    ///    so an empty source still yields an empty snapshot
    ///
    /// Returns the number of items loaded
    ///
    /// # Errors
    /// Returns an error if any stage fails; nothing is loaded in that case
    pub async fn run(&self) -> Result<usize> {
        log::info!("Starting ETL pipeline");

        log::debug!("Extracting from source...");
        let items = self.extractor.extract().await?;
        let extracted = items.len();
        log::info!("Extracted {} items", extracted);

        log::debug!("Transforming items...");
        let transformed = self.transformer.transform_many(items)?;
        if transformed.len() < extracted {
            log::info!(
                "Dropped {} of {} items",
                extracted - transformed.len(),
                extracted
            );
        }

        log::debug!("Loading to destination...");
        let count = self.loader.load(transformed).await?;
        log::info!("Loaded {} items", count);

        Ok(count)
    }
}

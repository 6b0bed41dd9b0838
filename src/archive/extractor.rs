//! Paginated archive extractor
//!
//! Walks the whole index with `search_after` paging under a fixed total
//! order (`date desc, _id desc`) until the service returns an empty page.

use super::checkpoint::CheckpointPolicy;
use super::query::{Cursor, SearchQuery, SortField, archive_sort};
use super::response::parse_page;
use crate::client::SearchTransport;
use crate::error::{ArchiveError, Result};
use crate::etl::Extractor;

use owo_colors::OwoColorize;
use serde_json::{Value, json};
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Extractor for the complete archive
///
/// Every page is requested with the cursor taken from the last hit of the
/// previous page. Any transport or protocol failure aborts the run; nothing
/// is retried.
///
/// # Example
/// ```no_run
/// use archive_puller::archive::ArchiveExtractor;
/// use archive_puller::client::{Auth, SearchClient, SearchConfig};
/// use std::time::Duration;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("http://localhost:9200/trump_tweets/_msearch")?;
/// let client = SearchClient::try_new(SearchConfig::new(url, Auth::None))?;
///
/// let extractor = ArchiveExtractor::new(client)
///     .with_page_size(500)
///     .with_delay(Duration::from_millis(250));
/// let records = extractor.fetch_all().await?;
/// # Ok(())
/// # }
/// ```
pub struct ArchiveExtractor<T> {
    transport: T,
    page_size: usize,
    delay: Duration,
    query: Value,
    sort: Vec<SortField>,
    checkpoints: Option<CheckpointPolicy>,
}

impl<T: SearchTransport> ArchiveExtractor<T> {
    /// Create an extractor over `transport` with the default page size,
    /// inter-page delay, `match_all` query and archive sort order
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            page_size: DEFAULT_PAGE_SIZE,
            delay: DEFAULT_PAGE_DELAY,
            query: json!({ "match_all": {} }),
            sort: archive_sort(),
            checkpoints: None,
        }
    }

    /// Records requested per page (at least one)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Pause between pages, to go easy on the remote service
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Restrict the walk to documents matching `query`
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Save progress per `policy`. The checkpoint is left on disk when the
    /// walk finishes; the caller clears it once the records are stored.
    pub fn with_checkpoints(mut self, policy: CheckpointPolicy) -> Self {
        self.checkpoints = Some(policy);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetch every record, in sort order.
    ///
    /// # Errors
    /// - [`ArchiveError::Transport`] on network failure or non-2xx status
    /// - [`ArchiveError::Protocol`] on a malformed or error-bearing
    ///   response, a hit without sort values, or a cursor that fails to
    ///   advance between two pages
    pub async fn fetch_all(&self) -> Result<Vec<Value>> {
        let (mut cursor, mut results, mut pages) = self.starting_point()?;

        loop {
            let body = SearchQuery::new(self.page_size, self.query.clone())
                .sorted_by(self.sort.clone())
                .after(cursor.clone())
                .to_msearch_body()?;
            log::debug!("Requesting page {}: {}", pages + 1, body.trim_end());

            let response = self.transport.msearch(body).await?;
            let hits = parse_page(response)?;

            let Some(last) = hits.last() else {
                log::info!("No more hits found, extraction complete");
                break;
            };

            let next = last.sort.clone().ok_or_else(|| {
                ArchiveError::protocol(format!(
                    "Last hit of page {} carries no sort values; cannot continue",
                    pages + 1
                ))
            })?;
            if cursor.as_ref() == Some(&next) {
                return Err(ArchiveError::protocol(format!(
                    "Cursor did not advance after page {} (stuck at {}); \
                     the sort order is not total",
                    pages + 1,
                    Value::Array(next)
                )));
            }

            results.extend(hits.into_iter().map(|hit| hit.source));
            pages += 1;
            log::info!(
                "Fetched page {}: {} records so far",
                pages,
                results.len().cyan()
            );

            if let Some(policy) = &self.checkpoints
                && policy.is_due(pages)
            {
                policy.store.save(&next, pages, &results)?;
            }
            cursor = Some(next);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(results)
    }

    fn starting_point(&self) -> Result<(Option<Cursor>, Vec<Value>, usize)> {
        let Some(policy) = self.checkpoints.as_ref().filter(|p| p.resume) else {
            return Ok((None, Vec::new(), 0));
        };

        match policy.store.load()? {
            Some(checkpoint) => {
                log::info!(
                    "Resuming from {} after page {} ({} records)",
                    policy.store.path().display().bright_black(),
                    checkpoint.pages,
                    checkpoint.records.len()
                );
                Ok((
                    Some(checkpoint.search_after),
                    checkpoint.records,
                    checkpoint.pages,
                ))
            }
            None => {
                log::info!("No checkpoint found, starting from the first page");
                Ok((None, Vec::new(), 0))
            }
        }
    }
}

impl<T: SearchTransport> Extractor for ArchiveExtractor<T> {
    type Item = Value;

    async fn extract(&self) -> eyre::Result<Vec<Self::Item>> {
        let records = self.fetch_all().await?;

        log::info!("Extracted {} record(s)", records.len());

        Ok(records)
    }
}

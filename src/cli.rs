//! CLI helper functions

use crate::{
    archive::{ArchiveExtractor, CheckpointPolicy, CheckpointStore, SearchQuery},
    cleaner::{CleanReport, clean},
    client::{SearchClient, SearchConfig, SearchTransport},
    etl::{IdentityTransformer, Pipeline},
    storage::{ChunkManifest, ChunkWriter, SnapshotReader, SnapshotWriter},
    transform::EmptyTextFilter,
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Build a search client from `ARCHIVE_*` environment variables
///
/// See [`SearchConfig::from_env`] for the variables read.
pub fn load_search_client() -> Result<SearchClient> {
    let config = SearchConfig::from_env()?;
    log::debug!("Using {} authentication", config.auth);
    SearchClient::try_new(config).context("Failed to create search client")
}

/// Settings for a full archive pull
#[derive(Debug, Clone)]
pub struct PullOptions {
    pub output: PathBuf,
    pub page_size: usize,
    pub delay: Duration,
    /// Save a checkpoint every N pages
    pub checkpoint_every: Option<usize>,
    /// Continue from an existing checkpoint
    pub resume: bool,
    /// Drop empty-text records before writing
    pub drop_empty: bool,
}

/// Pull the whole archive from the configured endpoint into a snapshot
///
/// Pipeline: ArchiveExtractor → (EmptyTextFilter) → SnapshotWriter
pub async fn pull_archive(options: &PullOptions) -> Result<usize> {
    log::info!("Connecting to search endpoint...");
    let client = load_search_client()?;
    log::info!("Using endpoint: {}", client.url().bright_black());

    pull_with(client, options).await
}

/// Run a pull against any transport
///
/// The snapshot is written once, atomically, after the last page; a failed
/// run leaves any previous snapshot at `options.output` untouched, along with
/// any checkpoint saved on the way.
pub async fn pull_with<T: SearchTransport>(transport: T, options: &PullOptions) -> Result<usize> {
    let mut extractor = ArchiveExtractor::new(transport)
        .with_page_size(options.page_size)
        .with_delay(options.delay);

    let checkpoint = options
        .checkpoint_every
        .map(|every| (CheckpointStore::for_snapshot(&options.output), every));
    if let Some((store, every)) = &checkpoint {
        log::info!(
            "Checkpointing every {} page(s) to {}",
            every,
            store.path().display().bright_black()
        );
        extractor = extractor
            .with_checkpoints(CheckpointPolicy::new(store.clone(), *every).resuming(options.resume));
    }

    log::info!(
        "Pulling archive into {} ({} records per page)",
        options.output.display().bright_black(),
        extractor.page_size()
    );

    let writer = SnapshotWriter::atomic(&options.output);
    let result = if options.drop_empty {
        Pipeline::new(extractor, EmptyTextFilter::default(), writer)
            .run()
            .await
    } else {
        Pipeline::new(extractor, IdentityTransformer::new(), writer)
            .run()
            .await
    };
    let count = result.context("Archive pull failed")?;

    // Only drop the checkpoint once the snapshot is safely on disk
    if let Some((store, _)) = &checkpoint {
        store.clear().context("Failed to remove checkpoint")?;
    }

    log::info!(
        "✓ Saved {} record(s) to {}",
        count.cyan(),
        options.output.display().bright_black()
    );

    Ok(count)
}

/// Remove empty-text records from a snapshot
///
/// Overwrites `input` atomically unless a different `output` is given.
pub fn clean_snapshot(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    sentinel: &str,
) -> Result<CleanReport> {
    let input = input.as_ref();
    log::info!("Cleaning {}", input.display().bright_black());

    let report = clean(input, sentinel, output)
        .with_context(|| format!("Failed to clean {}", input.display()))?;

    log::info!("Input entries: {}", report.input);
    log::info!(
        "Removed entries where text == {:?}: {}",
        sentinel,
        report.removed.cyan()
    );
    log::info!("Output entries: {}", report.output);
    log::info!("✓ Wrote: {}", report.written_to.display().bright_black());

    Ok(report)
}

/// Slice a snapshot into chunk files plus a manifest for static hosting
pub fn split_snapshot(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    chunk_size: usize,
) -> Result<ChunkManifest> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    log::info!("Reading {}", input.display().bright_black());
    let records = SnapshotReader::new(input)
        .read()
        .with_context(|| format!("Failed to read {}", input.display()))?;
    log::info!("Total records: {}", records.len());

    let manifest = ChunkWriter::new(output_dir, chunk_size)
        .write(records)
        .with_context(|| format!("Failed to split into {}", output_dir.display()))?;

    log::info!("Non-deleted records: {}", manifest.total_tweets);
    log::info!(
        "✓ Wrote {} chunk(s) to {}",
        manifest.total_chunks.cyan(),
        output_dir.display().bright_black()
    );

    Ok(manifest)
}

/// Parse a `field=value` filter; the value is read as JSON when it parses
/// (`isRetweet=false`), otherwise as a plain string (`device=Twitter for iPhone`)
pub fn parse_term(term: &str) -> Result<(String, Value)> {
    let (field, raw) = term
        .split_once('=')
        .ok_or_else(|| eyre::eyre!("Expected field=value, got '{}'", term))?;
    let field = field.trim();
    if field.is_empty() {
        eyre::bail!("Empty field name in '{}'", term);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field.to_string(), value))
}

/// Fetch a handful of records to check credentials and field layout
pub async fn sample_archive(size: usize, term: Option<&str>) -> Result<Value> {
    let client = load_search_client()?;
    sample_with(&client, size, term).await
}

/// Issue one unsorted query and return the raw response
pub async fn sample_with<T: SearchTransport>(
    transport: &T,
    size: usize,
    term: Option<&str>,
) -> Result<Value> {
    let query = match term {
        Some(term) => {
            let (field, value) = parse_term(term)?;
            log::info!("Sampling {} record(s) where {} = {}", size, field, value);
            SearchQuery::term(size, &field, value)
        }
        None => {
            log::info!("Sampling {} record(s)", size);
            SearchQuery::match_all(size)
        }
    };

    let response = transport
        .msearch(query.to_msearch_body()?)
        .await
        .context("Sample query failed")?;

    Ok(response)
}

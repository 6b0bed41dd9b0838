//! Search client module
//!
//! Provides `SearchClient` for posting NDJSON multi-search requests to the
//! archive's `_msearch` endpoint.

use super::{Auth, SearchTransport};
use crate::error::{ArchiveError, Result as ArchiveResult};
use eyre::{Context, Result};
use reqwest::Client;
use reqwest::header::{
    AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER,
};
use serde_json::Value;
use std::time::Duration;
use url::Url;

const NDJSON: &str = "application/x-ndjson";
const SEARCH_CLIENT_HEADER: HeaderName = HeaderName::from_static("x-search-client");

/// Default request timeout for a single page
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to reach the search endpoint.
///
/// The archive front-end identifies itself with a client name plus
/// `Origin`/`Referer` headers; the endpoint may refuse requests without them.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Full `_msearch` URL, index included (e.g. `https://host/trump_tweets/_msearch`)
    pub url: Url,
    pub auth: Auth,
    /// Value for the `X-Search-Client` header
    pub search_client: Option<String>,
    pub origin: Option<String>,
    pub referer: Option<String>,
    pub timeout: Duration,
}

impl SearchConfig {
    pub fn new(url: Url, auth: Auth) -> Self {
        Self {
            url,
            auth,
            search_client: None,
            origin: None,
            referer: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ARCHIVE_URL: `_msearch` endpoint URL (required)
    /// - ARCHIVE_USERNAME / ARCHIVE_PASSWORD: Basic auth (optional)
    /// - ARCHIVE_APIKEY: API key auth (optional, wins over username/password)
    /// - ARCHIVE_SEARCH_CLIENT: `X-Search-Client` header (optional)
    /// - ARCHIVE_ORIGIN / ARCHIVE_REFERER: browser origin headers (optional)
    /// - ARCHIVE_TIMEOUT_SECS: per-request timeout (optional, default 30)
    pub fn from_env() -> Result<Self> {
        let url_str =
            std::env::var("ARCHIVE_URL").context("ARCHIVE_URL environment variable not set")?;
        let url =
            Url::parse(&url_str).with_context(|| format!("Invalid ARCHIVE_URL: {}", url_str))?;

        let mut config = Self::new(url, Auth::from_env());
        config.search_client = std::env::var("ARCHIVE_SEARCH_CLIENT").ok();
        config.origin = std::env::var("ARCHIVE_ORIGIN").ok();
        config.referer = std::env::var("ARCHIVE_REFERER").ok();

        if let Ok(secs) = std::env::var("ARCHIVE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("Invalid ARCHIVE_TIMEOUT_SECS: {}", secs))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(NDJSON));
        if let Some(value) = self.auth.header_value() {
            headers.insert(AUTHORIZATION, value.parse()?);
        }
        if let Some(client) = &self.search_client {
            headers.insert(SEARCH_CLIENT_HEADER, client.parse()?);
        }
        if let Some(origin) = &self.origin {
            headers.insert(ORIGIN, origin.parse()?);
        }
        if let Some(referer) = &self.referer {
            headers.insert(REFERER, referer.parse()?);
        }
        Ok(headers)
    }
}

/// HTTP client for the archive's multi-search endpoint.
///
/// # Example
/// ```no_run
/// use archive_puller::client::{Auth, SearchClient, SearchConfig, SearchTransport};
/// use archive_puller::archive::SearchQuery;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("http://localhost:9200/trump_tweets/_msearch")?;
/// let client = SearchClient::try_new(SearchConfig::new(url, Auth::None))?;
/// let body = SearchQuery::match_all(1).to_msearch_body()?;
/// let response = client.msearch(body).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SearchClient {
    client: Client,
    url: Url,
}

impl SearchClient {
    /// Build a client with the configured headers baked in as defaults
    ///
    /// # Errors
    /// Returns an error if a header value is not valid ASCII or the HTTP
    /// client cannot be built.
    pub fn try_new(config: SearchConfig) -> Result<Self> {
        let headers = config
            .headers()
            .context("Failed to build search request headers")?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        log::debug!(
            "Search client for {} using {} authentication",
            config.url,
            config.auth
        );

        Ok(Self {
            client,
            url: config.url,
        })
    }

    /// Get the endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl SearchTransport for SearchClient {
    async fn msearch(&self, body: String) -> ArchiveResult<Value> {
        log::trace!("POST {} ({} bytes)", self.url, body.len());

        let response = self
            .client
            .post(self.url.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| ArchiveError::transport(None, format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            ArchiveError::transport(
                Some(status.as_u16()),
                format!("Failed to read response body: {}", e),
            )
        })?;

        if !status.is_success() {
            return Err(ArchiveError::transport(
                Some(status.as_u16()),
                format!("Search request failed ({}): {}", status, text),
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| ArchiveError::protocol(format!("Response is not valid JSON: {}", e)))
    }
}

impl std::fmt::Display for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

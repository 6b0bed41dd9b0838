//! Search endpoint client and authentication.
//!
//! This module provides the [`SearchClient`] for talking to the archive's
//! `_msearch` endpoint, the [`SearchTransport`] seam the extractor is generic
//! over, and authentication types ([`Auth`]).

mod auth;
mod search;

pub use auth::Auth;
pub use search::{SearchClient, SearchConfig};

use crate::error::Result;
use serde_json::Value;

/// Anything that can answer an NDJSON multi-search request
///
/// [`SearchClient`] implements this over HTTP; tests substitute an in-memory
/// index so the pagination logic can be exercised without a network.
pub trait SearchTransport: Send + Sync {
    /// Send one NDJSON request body and return the decoded JSON response
    ///
    /// # Errors
    /// Returns [`crate::ArchiveError::Transport`] for network failures and
    /// non-2xx statuses, and [`crate::ArchiveError::Protocol`] when the
    /// response body is not JSON.
    fn msearch(&self, body: String) -> impl std::future::Future<Output = Result<Value>> + Send;
}

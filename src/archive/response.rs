//! Multi-search response decoding

use super::Cursor;
use crate::error::{ArchiveError, Result};
use serde_json::Value;

/// One matched entry of a page
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// The archived record, copied verbatim
    pub source: Value,
    /// Sort-key values the service attaches for `search_after` continuation
    pub sort: Option<Cursor>,
}

impl Hit {
    fn from_value(position: usize, hit: Value) -> Result<Self> {
        let Value::Object(mut hit) = hit else {
            return Err(ArchiveError::protocol(format!(
                "Hit {} is not an object",
                position
            )));
        };

        let source = hit.remove("_source").ok_or_else(|| {
            ArchiveError::protocol(format!("Hit {} has no `_source` field", position))
        })?;

        let sort = match hit.remove("sort") {
            None | Some(Value::Null) => None,
            Some(Value::Array(values)) => Some(values),
            Some(other) => {
                return Err(ArchiveError::protocol(format!(
                    "Hit {} has a non-array `sort` field: {}",
                    position, other
                )));
            }
        };

        Ok(Self { source, sort })
    }
}

/// Decode the first response of an `_msearch` reply into its hits.
///
/// # Errors
/// Returns [`ArchiveError::Protocol`] when the `responses` envelope is
/// missing or empty, when the service reports a query error, or when the
/// `hits.hits` array is absent or malformed.
pub fn parse_page(mut response: Value) -> Result<Vec<Hit>> {
    let mut first = response
        .get_mut("responses")
        .and_then(Value::as_array_mut)
        .filter(|responses| !responses.is_empty())
        .map(|responses| responses.swap_remove(0))
        .ok_or_else(|| ArchiveError::protocol("Invalid response structure: no `responses`"))?;

    if let Some(error) = first.get("error") {
        return Err(ArchiveError::protocol(format!(
            "Search service reported an error: {}",
            error
        )));
    }

    let hits = match first.pointer_mut("/hits/hits").map(Value::take) {
        Some(Value::Array(hits)) => hits,
        Some(other) => {
            return Err(ArchiveError::protocol(format!(
                "`hits.hits` is not an array: {}",
                other
            )));
        }
        None => {
            return Err(ArchiveError::protocol(
                "Invalid response structure: no `hits.hits`",
            ));
        }
    };

    hits.into_iter()
        .enumerate()
        .map(|(position, hit)| Hit::from_value(position, hit))
        .collect()
}

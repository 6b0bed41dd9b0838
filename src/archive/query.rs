//! Multi-search query construction

use crate::error::{ArchiveError, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

/// Sort-key values of the last hit on a page, sent back as `search_after`
pub type Cursor = Vec<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One entry of the `sort` list, serialized as `{"field": "desc"}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

impl Serialize for SortField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.order)?;
        map.end()
    }
}

/// Total order used to walk the archive: newest first, `_id` breaks ties.
///
/// `date` alone is not unique, so without the tiebreaker a page boundary
/// that falls inside a run of equal dates can repeat or skip records.
pub fn archive_sort() -> Vec<SortField> {
    vec![SortField::desc("date"), SortField::desc("_id")]
}

/// Query object sent as the second line of an `_msearch` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub size: usize,
    pub query: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_after: Option<Cursor>,
}

impl SearchQuery {
    /// Query matching every document
    pub fn match_all(size: usize) -> Self {
        Self::new(size, json!({ "match_all": {} }))
    }

    /// Query matching documents whose `field` equals `value`
    pub fn term(size: usize, field: &str, value: Value) -> Self {
        Self::new(size, json!({ "term": { field: value } }))
    }

    pub fn new(size: usize, query: Value) -> Self {
        Self {
            size,
            query,
            sort: Vec::new(),
            search_after: None,
        }
    }

    pub fn sorted_by(mut self, sort: Vec<SortField>) -> Self {
        self.sort = sort;
        self
    }

    /// Resume after `cursor`; `None` requests the first page
    pub fn after(mut self, cursor: Option<Cursor>) -> Self {
        self.search_after = cursor;
        self
    }

    /// Render the two-line NDJSON body: an empty header then the query.
    ///
    /// The index is part of the endpoint URL, so the header stays `{}`.
    pub fn to_msearch_body(&self) -> Result<String> {
        let query = serde_json::to_string(self)
            .map_err(|e| ArchiveError::protocol(format!("Failed to encode query: {}", e)))?;
        Ok(format!("{{}}\n{}\n", query))
    }
}

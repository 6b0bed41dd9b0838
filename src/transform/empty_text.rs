//! Empty-text record filter
//!
//! Archived posts whose body was stripped render as a bare `<p></p>`. These
//! carry no content and are removed from snapshots.

use crate::etl::Transformer;
use eyre::Result;
use serde_json::Value;

/// Text value marking an empty post
pub const DEFAULT_SENTINEL: &str = "<p></p>";
/// Field holding the post body
pub const DEFAULT_TEXT_FIELD: &str = "text";

/// Drops records whose text field is exactly the sentinel
///
/// Matching is exact: no trimming or normalization, so `" <p></p> "` survives.
/// Entries that are not JSON objects can never match and are always kept.
///
/// # Example
/// ```
/// use archive_puller::transform::EmptyTextFilter;
/// use serde_json::json;
///
/// let filter = EmptyTextFilter::default();
/// let (kept, removed) = filter.apply(vec![
///     json!({"text": "<p></p>"}),
///     json!({"text": "hi"}),
/// ]);
/// assert_eq!(kept, vec![json!({"text": "hi"})]);
/// assert_eq!(removed, 1);
/// ```
#[derive(Debug, Clone)]
pub struct EmptyTextFilter {
    field: String,
    sentinel: String,
}

impl Default for EmptyTextFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL)
    }
}

impl EmptyTextFilter {
    /// Filter on the `text` field with the given sentinel
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            field: DEFAULT_TEXT_FIELD.to_string(),
            sentinel: sentinel.into(),
        }
    }

    /// Inspect a different field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// True when `record` is an object whose field equals the sentinel
    pub fn matches(&self, record: &Value) -> bool {
        record
            .as_object()
            .and_then(|obj| obj.get(&self.field))
            .and_then(Value::as_str)
            == Some(self.sentinel.as_str())
    }

    /// Remove matching records, returning the survivors in order and the
    /// number removed
    pub fn apply(&self, records: Vec<Value>) -> (Vec<Value>, usize) {
        let total = records.len();
        let kept: Vec<Value> = records.into_iter().filter(|r| !self.matches(r)).collect();
        let removed = total - kept.len();
        (kept, removed)
    }
}

impl Transformer for EmptyTextFilter {
    type Input = Value;
    type Output = Value;

    fn transform(&self, input: Self::Input) -> Result<Option<Self::Output>> {
        Ok((!self.matches(&input)).then_some(input))
    }
}

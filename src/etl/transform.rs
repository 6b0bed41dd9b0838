//! Transformer trait for per-record rewriting and filtering

use eyre::Result;

/// Transformer trait for transforming or dropping data items
///
/// Returning `Ok(None)` drops the item from the stream; this is how record
/// filters such as [`crate::transform::EmptyTextFilter`] plug into a pipeline.
///
/// # Example
/// ```no_run
/// use archive_puller::etl::Transformer;
/// use eyre::Result;
/// use serde_json::Value;
///
/// struct DropRetweets;
///
/// impl Transformer for DropRetweets {
///     type Input = Value;
///     type Output = Value;
///
///     fn transform(&self, input: Self::Input) -> Result<Option<Self::Output>> {
///         match input.get("isRetweet").and_then(Value::as_bool) {
///             Some(true) => Ok(None),
///             _ => Ok(Some(input)),
///         }
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Transform a single item, or drop it by returning `None`
    ///
    /// # Errors
    /// Returns an error if transformation fails (validation, conversion, etc.)
    fn transform(&self, input: Self::Input) -> Result<Option<Self::Output>>;

    /// Transform multiple items, preserving the order of the survivors
    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        let mut outputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            if let Some(output) = self.transform(input)? {
                outputs.push(output);
            }
        }
        Ok(outputs)
    }
}

/// Identity transformer that passes items through unchanged
///
/// Use this when you need a transformer but don't want to modify the data.
/// The generic parameter T must be specified when creating the transformer.
pub struct IdentityTransformer<T> {
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> Default for IdentityTransformer<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> IdentityTransformer<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Send> Transformer for IdentityTransformer<T> {
    type Input = T;
    type Output = T;

    fn transform(&self, input: Self::Input) -> Result<Option<Self::Output>> {
        Ok(Some(input))
    }
}

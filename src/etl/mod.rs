//! Core ETL (Extract, Transform, Load) abstractions
//!
//! A pull is an extract from the archive, an optional record filter, and a
//! load into a snapshot file. These traits keep the three stages swappable so
//! tests can run the same pipeline against in-memory sources.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::Pipeline;
pub use transform::{IdentityTransformer, Transformer};

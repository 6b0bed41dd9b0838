//! Record filters applied between extraction and loading

mod empty_text;

pub use empty_text::{DEFAULT_SENTINEL, DEFAULT_TEXT_FIELD, EmptyTextFilter};

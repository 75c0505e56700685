//! Blog search with fuzzy matching
//!
//! Substring and regex matching first, edit-distance and nucleo-based fuzzy
//! matching as the fallback when direct results are too thin.

pub mod engine;
pub mod fuzzy;

pub use engine::{SearchEngine, SearchPage, SearchQuery, SortKey};

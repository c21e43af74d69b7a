//! Full-text and object search over documentation search indexes.
//!
//! This module provides tokenization, query parsing, relevance weights and
//! the ranked search engine.

pub mod engine;
pub mod query;
pub mod scoring;
pub mod tokenize;

pub use engine::{ObjectSuggestion, ResultKind, SearchEngine, SearchResult};
pub use query::ParsedQuery;
pub use scoring::Scorer;
pub use tokenize::{STOP_WORDS, WordStemmer, split_words, word_filter};

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod index;
pub mod search;
pub mod server;
pub mod tools;
pub mod tracing;
pub mod worker;

pub use build::{DocumentSource, IndexBuilder, ObjectDescription};
pub use config::Config;
pub use index::{SearchIndex, ValidationReport, validate};
pub use search::{SearchEngine, SearchResult};
pub use worker::IndexState;

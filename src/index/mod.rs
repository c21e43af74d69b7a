//! The search index artifact: data model, payload codec, validation and
//! snapshot caching.

pub mod cache;
pub mod jsdump;
pub mod model;
pub mod validate;

pub use cache::SnapshotCache;
pub use model::{
    DocumentRef, IndexStats, ObjectEntry, ObjectName, ObjectRef, PRIORITY_DEFAULT,
    PRIORITY_IMPORTANT, PRIORITY_UNIMPORTANT, Postings, SearchIndex, full_name,
};
pub use validate::{Severity, ValidationIssue, ValidationReport, validate};

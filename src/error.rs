//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for application-level operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when reading or writing a search index payload fails.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The index file could not be read or written.
    #[error("failed to access search index at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text contains no object literal to decode.
    #[error("no search index payload found (expected `Search.setIndex({{...}})` or a JSON object)")]
    MissingPayload,

    /// The payload was found but is not a valid index document.
    #[error("malformed search index at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
    },

    /// The index could not be encoded.
    #[error("failed to encode search index: {0}")]
    Encode(String),
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        // serde_json appends " at line X column Y" to its Display output
        let message = err.to_string();
        let message = message
            .split(" at line ")
            .next()
            .unwrap_or(&message)
            .to_string();
        Self::Malformed {
            line: err.line(),
            column: err.column(),
            message,
        }
    }
}

/// Error returned when an index cannot be resolved for a request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// No index path was given and no default is configured.
    #[error("no search index configured; use set_index or pass an index path")]
    NoIndex,
    /// Index file not found at the expected path.
    #[error("search index not found at {}", path.display())]
    NotFound { path: PathBuf },
    /// Failed to load or parse the index file.
    #[error("failed to load search index {}: {error}", path.display())]
    Parse { path: PathBuf, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn test_json_error_keeps_position() {
        let err = serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err();
        let_assert!(IndexError::Malformed { line, message, .. } = IndexError::from(err));
        check!(line == 2);
        check!(!message.contains("at line"));
    }

    #[test]
    fn test_load_error_display() {
        let err = LoadError::NotFound {
            path: PathBuf::from("/tmp/searchindex.js"),
        };
        check!(err.to_string() == "search index not found at /tmp/searchindex.js");
    }
}

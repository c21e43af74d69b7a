//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Each test gets a fresh temporary directory holding a copy of the CCC
//! documentation index, and its own `IndexState` with an empty LRU cache and
//! snapshot caching switched off. Tests that exercise snapshots point the
//! cache at a directory inside the same temp dir.
//!
//! # Available Fixtures
//!
//! - `ccc_workspace`: temp dir with `searchindex.js`, state without an active index
//! - `ccc_active`: same, with the copied index already active
//! - `ccc_index`: the parsed fixture index on its own

use rstest::fixture;
use sphinx_index_mcp::config::Config;
use sphinx_index_mcp::index::{SearchIndex, jsdump};
use sphinx_index_mcp::worker::IndexState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Returns the project root directory (where Cargo.toml lives).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// The generated index of the Cost-of-Capital-Calculator documentation.
pub fn fixture_path() -> PathBuf {
    project_root().join("tests/fixtures/ccc_searchindex.js")
}

/// A temporary directory for test isolation.
///
/// Cleaned up when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content, creating parent directories.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    /// Copies a file from the real filesystem into this workspace.
    ///
    /// # Panics
    /// Panics if copying fails.
    pub fn copy_file(&self, source: &Path, dest_relative: &str) {
        let dest = self.root.join(dest_relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!(
                    "Failed to create parent directory for '{}': {}",
                    dest_relative, e
                )
            });
        }
        std::fs::copy(source, &dest).unwrap_or_else(|e| {
            panic!(
                "Failed to copy '{}' to '{}': {}",
                source.display(),
                dest_relative,
                e
            )
        });
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// A temp dir holding `searchindex.js` plus an isolated `IndexState`.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct IndexWorkspace {
    pub workspace: TempWorkspace,
    pub state: Arc<IndexState>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl IndexWorkspace {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.cache.enabled = false;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let workspace = TempWorkspace::new();
        workspace.copy_file(&fixture_path(), "html/searchindex.js");
        Self {
            workspace,
            state: Arc::new(IndexState::new(config)),
        }
    }

    /// Path of the copied index.
    pub fn index_path(&self) -> PathBuf {
        self.workspace.path().join("html/searchindex.js")
    }

    pub fn index_arg(&self) -> Option<String> {
        Some(self.index_path().display().to_string())
    }
}

impl Default for IndexWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[fixture]
pub fn ccc_workspace() -> IndexWorkspace {
    IndexWorkspace::new()
}

/// Workspace whose copied index is already the active one.
#[fixture]
pub async fn ccc_active() -> IndexWorkspace {
    let workspace = IndexWorkspace::new();
    workspace
        .state
        .set_active(&workspace.index_path())
        .await
        .expect("Failed to activate fixture index");
    workspace
}

#[fixture]
pub fn ccc_index() -> SearchIndex {
    jsdump::load(&fixture_path()).expect("Failed to parse fixture index")
}

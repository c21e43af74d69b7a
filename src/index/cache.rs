//! Snapshot cache for parsed indexes.
//!
//! Parsing a large `searchindex.js` is the expensive part of a load, so the
//! decoded [`SearchIndex`] is stored as a postcard snapshot next to a
//! fingerprint of the source bytes. A snapshot is only trusted when the
//! fingerprint still matches.

use crate::error::{IndexError, Result};
use crate::index::{SearchIndex, jsdump};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Bumped whenever the snapshot layout changes.
const SNAPSHOT_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    fingerprint: u64,
    index: SearchIndex,
}

/// Where snapshots live. `None` disables caching.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: Option<PathBuf>,
}

impl SnapshotCache {
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    pub const fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Snapshot file for a given index path.
    fn snapshot_path(&self, source: &Path) -> Option<PathBuf> {
        let key = xxh3_64(source.to_string_lossy().as_bytes());
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{:016x}.postcard", key)))
    }

    /// Load the index at `source`, using a snapshot when it is fresh and
    /// refreshing it otherwise.
    pub fn load(&self, source: &Path) -> Result<SearchIndex> {
        let bytes = std::fs::read(source).map_err(|e| IndexError::io(source, e))?;
        let fingerprint = xxh3_64(&bytes);

        let snapshot_path = self.snapshot_path(source);
        if let Some(path) = &snapshot_path
            && let Some(index) = read_snapshot(path, fingerprint)
        {
            tracing::debug!(
                "Using cached snapshot for {} ({})",
                source.display(),
                path.display()
            );
            return Ok(index);
        }

        let text = String::from_utf8(bytes)
            .with_context(|| format!("Search index {} is not valid UTF-8", source.display()))?;
        let start = std::time::Instant::now();
        let index = jsdump::parse(&text)
            .with_context(|| format!("Failed to parse search index {}", source.display()))?;
        tracing::info!(
            "Parsed search index {}: {} documents, {} terms in {:?}",
            source.display(),
            index.docnames.len(),
            index.terms.len(),
            start.elapsed()
        );

        if let Some(path) = &snapshot_path {
            write_snapshot(path, fingerprint, &index);
        }

        Ok(index)
    }
}

fn read_snapshot(path: &Path, fingerprint: u64) -> Option<SearchIndex> {
    let bytes = std::fs::read(path).ok()?;
    match postcard::from_bytes::<Snapshot>(&bytes) {
        Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION && snapshot.fingerprint == fingerprint => {
            Some(snapshot.index)
        }
        Ok(_) => {
            tracing::info!("Snapshot stale, will rebuild (file: {})", path.display());
            let _ = std::fs::remove_file(path);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to decode snapshot at {}: {}", path.display(), e);
            let _ = std::fs::remove_file(path);
            None
        }
    }
}

fn write_snapshot(path: &Path, fingerprint: u64, index: &SearchIndex) {
    if let Some(parent) = path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        tracing::warn!("Failed to create cache directory {}: {}", parent.display(), e);
        return;
    }

    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        fingerprint,
        index: index.clone(),
    };

    match postcard::to_stdvec(&snapshot) {
        Ok(bytes) => {
            if let Err(e) = std::fs::write(path, bytes) {
                tracing::warn!("Failed to write snapshot to {}: {}", path.display(), e);
                let _ = std::fs::remove_file(path);
            } else {
                tracing::debug!("Cached snapshot to {}", path.display());
            }
        }
        Err(e) => tracing::warn!("Failed to encode snapshot: {}", e),
    }
}

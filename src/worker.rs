//! Shared index state and the background file watcher.
//!
//! Loaded indexes are cached in an LRU keyed by canonical path. Concurrent
//! requests for an index that is still loading await the same shared
//! future. The watcher polls modification times and evicts indexes whose
//! file changed on disk.

use crate::config::{Config, expand_tilde};
use crate::error::LoadError;
use crate::index::{SearchIndex, SnapshotCache};
use crate::search::SearchEngine;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Maximum number of parsed indexes kept in memory.
const LRU_CACHE_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(15);

type SharedLoadFuture = Shared<BoxFuture<'static, Result<Arc<LoadedIndex>, LoadError>>>;

/// An index together with where and when it was read.
#[derive(Debug)]
pub struct LoadedIndex {
    pub path: PathBuf,
    pub index: SearchIndex,
    /// Modification time of the file when it was loaded.
    pub modified: Option<SystemTime>,
}

/// Shared state for the server and CLI.
pub struct IndexState {
    config: Config,
    snapshots: SnapshotCache,
    engine: SearchEngine,

    /// LRU cache of loaded indexes
    cache: RwLock<LruCache<PathBuf, Arc<LoadedIndex>>>,

    /// In-flight loads (can be awaited by multiple callers)
    in_flight: Mutex<HashMap<PathBuf, SharedLoadFuture>>,

    /// Index used when a request names none
    active: RwLock<Option<PathBuf>>,
}

impl std::fmt::Debug for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexState")
            .field("snapshots", &self.snapshots)
            .field("cache_size", &self.cache.try_read().map(|c| c.len()).ok())
            .field("active", &self.active.try_read().map(|a| a.clone()).ok())
            .finish()
    }
}

impl IndexState {
    pub fn new(config: Config) -> Self {
        let snapshots = config
            .cache
            .resolved_dir()
            .map_or_else(SnapshotCache::disabled, SnapshotCache::new);
        let engine = SearchEngine::new(config.scorer);
        let active = config.default_index();
        Self {
            config,
            snapshots,
            engine,
            cache: RwLock::new(LruCache::new(LRU_CACHE_SIZE)),
            in_flight: Mutex::new(HashMap::new()),
            active: RwLock::new(active),
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    /// The active index path, if any.
    pub async fn active(&self) -> Option<PathBuf> {
        self.active.read().await.clone()
    }

    /// Load `path` and make it the active index.
    ///
    /// Returns the previous active path and the loaded index.
    pub async fn set_active(
        &self,
        path: &Path,
    ) -> Result<(Option<PathBuf>, Arc<LoadedIndex>), LoadError> {
        let loaded = self.get(path).await?;
        let previous = self.active.write().await.replace(loaded.path.clone());
        tracing::info!("Active search index set to {}", loaded.path.display());
        Ok((previous, loaded))
    }

    /// Load the index named by a request, or the active one.
    pub async fn resolve(&self, index: Option<&str>) -> Result<Arc<LoadedIndex>, LoadError> {
        let path = match index.map(str::trim).filter(|p| !p.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => self.active().await.ok_or(LoadError::NoIndex)?,
        };
        self.get(&path).await
    }

    /// Get an index, waiting for an in-flight load if needed.
    pub async fn get(&self, path: &Path) -> Result<Arc<LoadedIndex>, LoadError> {
        let path = canonical_index_path(path)?;

        {
            let mut cache = self.cache.write().await;
            if let Some(loaded) = cache.get(&path) {
                tracing::debug!("Cache hit for {}", path.display());
                return Ok(loaded.clone());
            }
        }

        let future = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(future) = in_flight.get(&path) {
                tracing::debug!("Awaiting in-flight load for {}", path.display());
                future.clone()
            } else {
                let future = self.load_future(path.clone());
                in_flight.insert(path.clone(), future.clone());
                future
            }
        };

        let result = future.await;

        // Cache before leaving in-flight so late callers always find one of them
        if let Ok(loaded) = &result {
            self.cache.write().await.put(path.clone(), loaded.clone());
        }
        self.in_flight.lock().await.remove(&path);
        result
    }

    fn load_future(&self, path: PathBuf) -> SharedLoadFuture {
        let snapshots = self.snapshots.clone();
        let future: BoxFuture<'static, Result<Arc<LoadedIndex>, LoadError>> =
            Box::pin(async move {
                tracing::info!("Loading search index {}", path.display());
                let task_path = path.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let modified = modified_time(&task_path);
                    snapshots.load(&task_path).map(|index| LoadedIndex {
                        path: task_path,
                        index,
                        modified,
                    })
                })
                .await;

                match joined {
                    Ok(Ok(loaded)) => Ok(Arc::new(loaded)),
                    Ok(Err(e)) => Err(LoadError::Parse {
                        path,
                        error: format!("{:#}", e),
                    }),
                    Err(e) => Err(LoadError::Parse {
                        path,
                        error: format!("load task failed: {}", e),
                    }),
                }
            });
        future.shared()
    }

    /// Check if an index is cached.
    pub async fn is_cached(&self, path: &Path) -> bool {
        self.cache.read().await.contains(path)
    }

    /// Drop one cached index.
    pub async fn evict(&self, path: &Path) -> bool {
        self.cache.write().await.pop(path).is_some()
    }

    /// Clear all cached indexes.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        self.in_flight.lock().await.clear();
    }

    /// Evict cached indexes whose file changed or disappeared.
    ///
    /// Returns the evicted paths.
    pub async fn evict_stale(&self) -> Vec<PathBuf> {
        let mut cache = self.cache.write().await;
        let stale: Vec<PathBuf> = cache
            .iter()
            .filter(|(path, loaded)| modified_time(path) != loaded.modified)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &stale {
            cache.pop(path);
            tracing::info!("Search index changed on disk, evicted {}", path.display());
        }
        stale
    }
}

fn canonical_index_path(path: &Path) -> Result<PathBuf, LoadError> {
    let expanded = expand_tilde(path);
    let path = if expanded.is_dir() {
        expanded.join("searchindex.js")
    } else {
        expanded
    };
    std::fs::canonicalize(&path).map_err(|_| LoadError::NotFound { path })
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Background task that evicts indexes changed on disk and reloads the
/// active one.
pub struct IndexWatcher {
    state: Arc<IndexState>,
    cancel: CancellationToken,
}

impl IndexWatcher {
    pub fn new(state: Arc<IndexState>, cancel: CancellationToken) -> Self {
        Self { state, cancel }
    }

    /// Run until cancelled. Returns immediately when watching is disabled.
    pub async fn run(&self) {
        let Some(period) = self.state.config().watch.interval() else {
            tracing::debug!("Index watching disabled");
            return;
        };
        let mut ticker = tokio::time::interval(period);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::debug!("Index watcher stopped");
                    return;
                }
                _ = ticker.tick() => self.check().await,
            }
        }
    }

    /// One polling cycle.
    pub async fn check(&self) {
        let evicted = self.state.evict_stale().await;
        let Some(active) = self.state.active().await else {
            return;
        };
        if evicted.iter().any(|path| *path == active)
            && let Err(e) = self.state.get(&active).await
        {
            tracing::warn!("Failed to reload {}: {}", active.display(), e);
        }
    }
}

/// Spawn the watcher as a tokio task.
pub fn spawn_watcher(
    state: Arc<IndexState>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { IndexWatcher::new(state, cancel).run().await })
}

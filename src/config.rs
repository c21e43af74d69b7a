//! Configuration file handling.
//!
//! Settings are read from TOML. Every section and key is optional:
//!
//! ```toml
//! [index]
//! path = "docs/_build/html/searchindex.js"
//!
//! [search]
//! limit = 10
//!
//! [scorer]
//! title = 15
//! term = 5
//!
//! [cache]
//! enabled = true
//! dir = "~/.cache/sphinx-index-mcp"
//!
//! [watch]
//! interval_secs = 5
//! ```

use crate::error::Result;
use crate::search::Scorer;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sphinx-index.toml";

/// Environment variable that overrides `[index] path`.
pub const INDEX_PATH_ENV: &str = "SPHINX_INDEX_PATH";

const APP_DIR: &str = "sphinx-index-mcp";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
    pub search: SearchConfig,
    pub scorer: Scorer,
    pub cache: CacheConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index used when a request names none.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default number of results.
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

impl SearchConfig {
    /// The requested result count, or the default, never below one.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.limit).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Snapshot directory; defaults to the user cache directory.
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// Resolved snapshot directory, or `None` when caching is off.
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }
        self.dir
            .as_deref()
            .map(expand_tilde)
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_DIR)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between modification checks; 0 disables watching.
    pub interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

impl WatchConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl Config {
    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML in {}", path.display()))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `./sphinx-index.toml` is tried,
    /// then `<config dir>/sphinx-index-mcp/config.toml`; without either the
    /// defaults apply. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover() {
                Some(path) => {
                    tracing::debug!("Using config file {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides())
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("config.toml"))
            .filter(|path| path.is_file())
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(INDEX_PATH_ENV)
            && !path.trim().is_empty()
        {
            self.index.path = Some(PathBuf::from(path));
        }
        self
    }

    /// Default index path with `~` expanded.
    pub fn default_index(&self) -> Option<PathBuf> {
        self.index.path.as_deref().map(expand_tilde)
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn test_effective_limit() {
        let search = SearchConfig { limit: 0 };
        check!(search.effective_limit(None) == 1);
        check!(search.effective_limit(Some(0)) == 1);
        check!(search.effective_limit(Some(7)) == 7);
        check!(SearchConfig::default().effective_limit(None) == 10);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let_assert!(Ok(config) = toml::from_str::<Config>(""));
        check!(config == Config::default());
        check!(config.search.limit == 10);
        check!(config.watch.interval() == Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_partial_sections() {
        let text = r#"
[index]
path = "docs/searchindex.js"

[scorer]
title = 30

[watch]
interval_secs = 0
"#;
        let_assert!(Ok(config) = toml::from_str::<Config>(text));
        check!(config.index.path == Some(PathBuf::from("docs/searchindex.js")));
        check!(config.scorer.title == 30);
        check!(config.scorer.term == 5);
        check!(config.watch.interval().is_none());
        check!(config.cache.enabled);
    }

    #[test]
    fn test_from_file_reports_bad_toml() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bad.toml");
        std::fs::write(&path, "[search\nlimit = 3").unwrap();
        let_assert!(Err(err) = Config::from_file(&path));
        check!(format!("{:#}", err).contains("Failed to parse TOML"));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = tempfile::tempdir().unwrap();
        check!(Config::load(Some(&temp.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_disabled_cache_has_no_dir() {
        let cache = CacheConfig {
            enabled: false,
            dir: Some(PathBuf::from("/tmp/x")),
        };
        check!(cache.resolved_dir().is_none());

        let cache = CacheConfig {
            enabled: true,
            dir: Some(PathBuf::from("/tmp/x")),
        };
        check!(cache.resolved_dir() == Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_expand_tilde() {
        check!(expand_tilde(Path::new("/abs/path")) == PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            check!(expand_tilde(Path::new("~/docs")) == home.join("docs"));
        }
    }
}

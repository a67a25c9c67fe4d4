//! Shared download cache for repository clones
//!
//! Every backend clones sources into one content-addressed location so
//! repeated installs and updates avoid re-fetching. The cache is shared
//! between concurrent vendra processes; mutating runs hold the advisory
//! lock in [`guard`] for their whole duration.
//!
//! ## Cache structure
//!
//! ```text
//! ~/.cache/vendra/
//! ├── .lock                        # advisory guard for mutating runs
//! └── sources/
//!     └── <url-slug>/              # one clone per repository URL
//! ```

pub mod guard;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VendraError};

pub use guard::CacheGuard;

/// Default cache directory name under the user's cache directory
const CACHE_DIR: &str = "vendra";

/// Sources subdirectory within the cache
const SOURCES_DIR: &str = "sources";

/// Lock file guarding mutating runs
const LOCK_FILE: &str = ".lock";

/// Get the default cache directory path
///
/// Returns `~/.cache/vendra` on Unix or the platform equivalent elsewhere.
/// Can be overridden with the `VENDRA_CACHE_DIR` environment variable.
pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("VENDRA_CACHE_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let base = dirs::cache_dir().ok_or_else(|| VendraError::CacheOperationFailed {
        message: "Could not determine cache directory".to_string(),
    })?;

    Ok(base.join(CACHE_DIR))
}

/// Generate a cache key (URL slug) from a repository URL
///
/// Normalizes the URL by removing protocol prefixes and replacing special
/// characters. Example: "https://example.com/owner/repo.git" ->
/// "example.com-owner-repo"
pub fn url_to_slug(url: &str) -> String {
    url.replace("https://", "")
        .replace("http://", "")
        .replace("ssh://", "")
        .replace("git@", "")
        .replace([':', '/', '\\'], "-")
        .replace(".git", "")
        .trim_matches('-')
        .to_string()
}

/// Handle to the shared download cache
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    /// Open the cache at the default location
    pub fn new() -> Result<Self> {
        Ok(Self { dir: cache_dir()? })
    }

    /// Open a cache rooted at a specific directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the cache
    pub fn location(&self) -> &Path {
        &self.dir
    }

    /// Path of the advisory lock file
    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Path where the clone of `url` lives (whether or not it exists yet)
    pub fn source_path(&self, url: &str) -> PathBuf {
        self.dir.join(SOURCES_DIR).join(url_to_slug(url))
    }

    /// Remove all cached sources, returning how many were deleted
    pub fn clean(&self) -> Result<usize> {
        let sources = self.dir.join(SOURCES_DIR);
        if !sources.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&sources).map_err(|e| VendraError::CacheOperationFailed {
            message: format!("{}: {}", sources.display(), e),
        })? {
            let entry = entry.map_err(|e| VendraError::CacheOperationFailed {
                message: e.to_string(),
            })?;
            if entry.path().is_dir() {
                fs::remove_dir_all(entry.path()).map_err(|e| {
                    VendraError::CacheOperationFailed {
                        message: format!("{}: {}", entry.path().display(), e),
                    }
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

//! Advisory lock over the shared download cache
//!
//! A mutating run (install or update) acquires the guard once before any
//! disk work and holds it until the run exits. Acquisition fails fast when
//! another process holds the lock; release happens on drop so every exit
//! path, including panics, lets the next run proceed.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use fs4::fs_std::FileExt;

use crate::error::{Result, VendraError};

use super::Cache;

/// Exclusive file lock held for the duration of a mutating run
#[derive(Debug)]
pub struct CacheGuard {
    file: File,
    path: PathBuf,
}

impl CacheGuard {
    /// Acquire the cache lock, failing fast if another run holds it
    pub fn acquire(cache: &Cache) -> Result<Self> {
        fs::create_dir_all(cache.location())?;

        let path = cache.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(VendraError::CacheLocked {
                    path: path.display().to_string(),
                });
            }
            Err(e) => {
                return Err(VendraError::CacheOperationFailed {
                    message: format!("{}: {}", path.display(), e),
                });
            }
        }

        Ok(Self { file, path })
    }

    /// Path of the held lock file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for CacheGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

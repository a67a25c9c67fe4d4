//! Project workspace discovery
//!
//! A project is any directory holding a vendra.yaml manifest. Discovery
//! starts from an explicit directory or the working directory and walks up
//! parent directories, so commands work from anywhere inside the project.

use std::path::{Path, PathBuf};

use crate::error::{Result, VendraError};
use crate::lockfile::LOCK_FILE;
use crate::manifest::{MANIFEST_FILE, Manifest};

/// Vendor directory name under the project root
pub const VENDOR_DIR: &str = "vendor";

/// A located project root
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
}

impl Project {
    /// Locate the project containing `start` (or the working directory)
    pub fn find(start: Option<PathBuf>) -> Result<Self> {
        let start = match start {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let start = dunce::canonicalize(&start).unwrap_or(start);

        for dir in start.ancestors() {
            if dir.join(MANIFEST_FILE).is_file() {
                return Ok(Self {
                    root: dir.to_path_buf(),
                });
            }
        }

        Err(VendraError::ConfigMissing {
            path: start.display().to_string(),
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn vendor_path(&self) -> PathBuf {
        self.root.join(VENDOR_DIR)
    }

    /// Whether a lock artifact exists for this project
    pub fn has_lock(&self) -> bool {
        self.lock_path().is_file()
    }

    /// Load and validate the project manifest
    pub fn load_manifest(&self) -> Result<Manifest> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Err(VendraError::ConfigMissing {
                path: self.root.display().to_string(),
            });
        }
        Manifest::from_file(&path)
    }
}

/// Whether `path` is inside a vendra project
#[allow(dead_code)]
pub fn is_project(path: &Path) -> bool {
    path.join(MANIFEST_FILE).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::create_temp_dir;

    #[test]
    fn test_find_at_root() {
        let temp = create_temp_dir();
        std::fs::write(temp.path().join(MANIFEST_FILE), "package: example.com/p\n").unwrap();

        let project = Project::find(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(
            project.root,
            dunce::canonicalize(temp.path()).unwrap_or_else(|_| temp.path().to_path_buf())
        );
    }

    #[test]
    fn test_find_from_nested_directory() {
        let temp = create_temp_dir();
        std::fs::write(temp.path().join(MANIFEST_FILE), "package: example.com/p\n").unwrap();
        let nested = temp.path().join("deep/nested/dir");
        std::fs::create_dir_all(&nested).unwrap();

        let project = Project::find(Some(nested)).unwrap();
        assert!(project.manifest_path().is_file());
    }

    #[test]
    fn test_find_without_manifest_fails() {
        let temp = create_temp_dir();
        let result = Project::find(Some(temp.path().to_path_buf()));
        assert!(matches!(result, Err(VendraError::ConfigMissing { .. })));
    }

    #[test]
    fn test_load_manifest_and_lock_detection() {
        let temp = create_temp_dir();
        std::fs::write(
            temp.path().join(MANIFEST_FILE),
            "package: example.com/p\nimports:\n- package: example.com/a\n",
        )
        .unwrap();

        let project = Project::find(Some(temp.path().to_path_buf())).unwrap();
        let manifest = project.load_manifest().unwrap();
        assert_eq!(manifest.package, "example.com/p");
        assert!(!project.has_lock());

        std::fs::write(project.lock_path(), "hash: blake3:abc\n").unwrap();
        assert!(project.has_lock());
    }
}

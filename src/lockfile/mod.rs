//! Lockfile (vendra.lock) model
//!
//! The lockfile records the fully resolved transitive dependency set with
//! exact revisions, plus the content hash of the manifest it was generated
//! from. Imports are kept sorted by name so the serialized artifact is
//! deterministic and diffs cleanly; `Load(Save(x)) == x` holds for any
//! lockfile.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VendraError};
use crate::manifest::Manifest;
use crate::vcs::VcsKind;

/// Lock file name at the project root
pub const LOCK_FILE: &str = "vendra.lock";

/// A resolved package pinned in the lockfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedImport {
    /// Import path
    pub name: String,

    /// Repository URL the package was resolved from
    pub repo: String,

    /// VCS backend of the repository
    #[serde(default = "default_vcs")]
    pub vcs: VcsKind,

    /// Pinned immutable revision identifier, never a symbolic reference
    pub revision: String,

    /// Subpackages carried over from the declaring manifests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subpackages: Vec<String>,
}

fn default_vcs() -> VcsKind {
    VcsKind::Git
}

impl LockedImport {
    /// Validate a locked import read from disk
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(VendraError::LockUnreadable {
                path: LOCK_FILE.to_string(),
                reason: "locked import has an empty name".to_string(),
            });
        }
        if self.revision.is_empty() {
            return Err(VendraError::LockUnreadable {
                path: LOCK_FILE.to_string(),
                reason: format!("locked import '{}' has an empty revision", self.name),
            });
        }
        Ok(())
    }
}

/// Lockfile structure (vendra.lock)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Content hash of the manifest this lock was generated from
    pub hash: String,

    /// Resolved packages, sorted by import path
    #[serde(default)]
    pub imports: Vec<LockedImport>,
}

impl Lockfile {
    /// Create an empty lockfile for a manifest hash
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            imports: Vec::new(),
        }
    }

    /// Add a resolved import, keeping the set sorted by name
    pub fn add(&mut self, import: LockedImport) {
        match self
            .imports
            .binary_search_by(|probe| probe.name.cmp(&import.name))
        {
            Ok(pos) => self.imports[pos] = import,
            Err(pos) => self.imports.insert(pos, import),
        }
    }

    /// Look up a locked import by name
    pub fn get(&self, name: &str) -> Option<&LockedImport> {
        self.imports.iter().find(|i| i.name == name)
    }

    /// Whether the lock no longer matches the live manifest.
    ///
    /// Advisory only: a stale lock warns but never blocks installation.
    pub fn is_stale(&self, manifest: &Manifest) -> bool {
        !crate::hash::verify_hash(&self.hash, &manifest.content_hash())
    }

    /// Parse a lockfile from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let lockfile: Self = serde_yaml::from_str(yaml).map_err(|e| VendraError::LockUnreadable {
            path: LOCK_FILE.to_string(),
            reason: e.to_string(),
        })?;
        for import in &lockfile.imports {
            import.validate()?;
        }
        Ok(lockfile)
    }

    /// Load the lockfile at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VendraError::LockUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&contents).map_err(|e| match e {
            VendraError::LockUnreadable { reason, .. } => VendraError::LockUnreadable {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Serialize to YAML with imports sorted by name
    pub fn to_yaml(&self) -> Result<String> {
        let mut sorted = self.clone();
        sorted.imports.sort_by(|a, b| a.name.cmp(&b.name));
        serde_yaml::to_string(&sorted).map_err(|e| VendraError::LockWriteFailed {
            path: LOCK_FILE.to_string(),
            reason: e.to_string(),
        })
    }

    /// Persist the lockfile to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml).map_err(|e| VendraError::LockWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Dependency;
    use crate::test_fixtures::create_temp_dir;

    fn locked(name: &str, revision: &str) -> LockedImport {
        LockedImport {
            name: name.to_string(),
            repo: format!("https://{name}"),
            vcs: VcsKind::Git,
            revision: revision.to_string(),
            subpackages: Vec::new(),
        }
    }

    fn sample_lockfile() -> Lockfile {
        let mut lock = Lockfile::new("blake3:abc123");
        lock.add(locked("example.com/b", "bbb"));
        lock.add(locked("example.com/a", "aaa"));
        lock
    }

    #[test]
    fn test_add_keeps_imports_sorted() {
        let lock = sample_lockfile();
        let names: Vec<_> = lock.imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["example.com/a", "example.com/b"]);
    }

    #[test]
    fn test_add_replaces_existing_name() {
        let mut lock = sample_lockfile();
        lock.add(locked("example.com/a", "ccc"));
        assert_eq!(lock.imports.len(), 2);
        assert_eq!(lock.get("example.com/a").unwrap().revision, "ccc");
    }

    #[test]
    fn test_round_trip() {
        let lock = sample_lockfile();
        let yaml = lock.to_yaml().unwrap();
        let reloaded = Lockfile::from_yaml(&yaml).unwrap();
        assert_eq!(lock, reloaded);
    }

    #[test]
    fn test_round_trip_through_file() {
        let temp = create_temp_dir();
        let path = temp.path().join(LOCK_FILE);

        let lock = sample_lockfile();
        lock.write_to(&path).unwrap();
        let reloaded = Lockfile::from_file(&path).unwrap();
        assert_eq!(lock, reloaded);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let mut a = Lockfile::new("blake3:abc123");
        a.add(locked("example.com/a", "aaa"));
        a.add(locked("example.com/b", "bbb"));

        let mut b = Lockfile::new("blake3:abc123");
        b.add(locked("example.com/b", "bbb"));
        b.add(locked("example.com/a", "aaa"));

        assert_eq!(a.to_yaml().unwrap(), b.to_yaml().unwrap());
    }

    #[test]
    fn test_corrupt_lockfile_is_unreadable() {
        let result = Lockfile::from_yaml("hash: [not, a, string");
        assert!(matches!(result, Err(VendraError::LockUnreadable { .. })));
    }

    #[test]
    fn test_missing_lockfile_is_unreadable() {
        let temp = create_temp_dir();
        let result = Lockfile::from_file(&temp.path().join("nope.lock"));
        assert!(matches!(result, Err(VendraError::LockUnreadable { .. })));
    }

    #[test]
    fn test_staleness_detection() {
        let manifest = Manifest {
            package: "example.com/me/project".to_string(),
            imports: vec![Dependency::new("example.com/a", None)],
        };

        let lock = Lockfile::new(manifest.content_hash());
        assert!(!lock.is_stale(&manifest));

        let mut changed = manifest.clone();
        changed
            .imports
            .push(Dependency::new("example.com/b", None));
        assert!(lock.is_stale(&changed));
    }

    #[test]
    fn test_empty_revision_rejected() {
        let yaml = "hash: blake3:abc\nimports:\n- name: example.com/a\n  repo: https://example.com/a\n  revision: ''\n";
        let result = Lockfile::from_yaml(yaml);
        assert!(result.is_err());
    }
}

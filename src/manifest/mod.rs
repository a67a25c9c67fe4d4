//! Manifest (vendra.yaml) model
//!
//! The manifest declares the project's direct dependencies with version
//! constraints. It is consumed read-only by the resolver; the only derived
//! value is a deterministic content hash stored in the lock file and used
//! for staleness detection. The hash is order-independent over the
//! dependency set, so reordering entries does not invalidate a lock.

pub mod constraint;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use constraint::Constraint;

use crate::error::{Result, VendraError};
use crate::hash;
use crate::vcs::VcsKind;

/// Manifest file name at the project root
pub const MANIFEST_FILE: &str = "vendra.yaml";

/// A dependency declaration in vendra.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Import path, unique within one manifest (e.g. "example.com/owner/lib")
    pub package: String,

    /// Version constraint: a semver range, a branch/tag name, or a revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Repository URL override; defaults to https://<package>
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// VCS backend override; defaults to git
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs: Option<VcsKind>,

    /// Subpackages of this import used by the project
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subpackages: Vec<String>,
}

impl Dependency {
    /// Create a dependency on an import path with an optional constraint
    pub fn new(package: impl Into<String>, version: Option<String>) -> Self {
        Self {
            package: package.into(),
            version,
            repo: None,
            vcs: None,
            subpackages: Vec::new(),
        }
    }

    /// Repository URL for this dependency.
    ///
    /// An import path doubles as the repository location unless an explicit
    /// `repo` override is given.
    pub fn repo_url(&self) -> String {
        self.repo
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.package))
    }

    /// Parse this dependency's version constraint
    pub fn constraint(&self) -> Result<Constraint> {
        Constraint::parse(&self.package, self.version.as_deref())
    }

    /// VCS backend for this dependency
    pub fn vcs_kind(&self) -> VcsKind {
        self.vcs.unwrap_or(VcsKind::Git)
    }

    /// Validate dependency
    pub fn validate(&self) -> Result<()> {
        if self.package.is_empty() {
            return Err(VendraError::ManifestInvalid {
                message: "Dependency package path cannot be empty".to_string(),
            });
        }
        self.constraint()?;
        Ok(())
    }
}

/// Manifest structure (vendra.yaml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Import path of the project itself
    pub package: String,

    /// Direct dependency declarations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Dependency>,
}

impl Manifest {
    /// Parse a manifest from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(yaml).map_err(|e| VendraError::ManifestInvalid {
                message: e.to_string(),
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load and validate the manifest at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| VendraError::ManifestInvalid {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_yaml(&contents)
    }

    /// Validate the manifest: non-empty unique import paths
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for dep in &self.imports {
            dep.validate()?;
            if !seen.insert(dep.package.as_str()) {
                return Err(VendraError::DuplicateImport {
                    name: dep.package.clone(),
                });
            }
        }
        Ok(())
    }

    /// Deterministic content hash over the dependency set.
    ///
    /// Order-independent: entries are sorted by import path before hashing.
    /// Used solely for lock staleness comparison, not integrity.
    pub fn content_hash(&self) -> String {
        let mut records: Vec<[String; 5]> = self
            .imports
            .iter()
            .map(|dep| {
                let mut subs = dep.subpackages.clone();
                subs.sort();
                [
                    dep.package.clone(),
                    dep.version.clone().unwrap_or_default(),
                    dep.repo.clone().unwrap_or_default(),
                    dep.vcs_kind().to_string(),
                    subs.join(","),
                ]
            })
            .collect();
        records.sort();
        hash::hash_records(records)
    }

    /// Find a direct dependency by import path
    pub fn find(&self, package: &str) -> Option<&Dependency> {
        self.imports.iter().find(|d| d.package == package)
    }
}

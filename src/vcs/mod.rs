//! Version control backends
//!
//! The resolver and installer never talk to a concrete VCS. They depend on
//! the [`Vcs`] capability: resolve a symbolic constraint to a concrete
//! revision, materialize a checkout at a revision, and report the revision
//! of an existing checkout. One implementation exists per backend kind;
//! test code substitutes a scripted fake.

pub mod command;
pub mod git;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::error::Result;
use crate::manifest::Constraint;

pub use command::CommandBackend;
pub use git::GitBackend;

/// Supported version control backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Git,
    Hg,
    Svn,
    Bzr,
}

impl VcsKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VcsKind::Git => "git",
            VcsKind::Hg => "hg",
            VcsKind::Svn => "svn",
            VcsKind::Bzr => "bzr",
        }
    }

    /// Name of the metadata directory this backend leaves in checkouts
    pub fn metadata_dir(self) -> &'static str {
        match self {
            VcsKind::Git => ".git",
            VcsKind::Hg => ".hg",
            VcsKind::Svn => ".svn",
            VcsKind::Bzr => ".bzr",
        }
    }

    /// All backend kinds, used when scrubbing metadata of any origin
    pub fn all() -> [VcsKind; 4] {
        [VcsKind::Git, VcsKind::Hg, VcsKind::Svn, VcsKind::Bzr]
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbolic constraint resolved to a concrete revision.
///
/// `reference` carries the symbolic name the backend chose (a tag or branch)
/// when one was involved; constraint narrowing uses it to check that a
/// revision picked for one requirement still satisfies another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Immutable revision identifier (e.g. a commit hash)
    pub revision: String,
    /// Symbolic reference the revision was derived from, if any
    pub reference: Option<String>,
}

/// Capability interface over one version control backend
pub trait Vcs: Send + Sync {
    /// Resolve a version constraint against a repository to a concrete revision
    fn resolve_reference(&self, url: &str, constraint: &Constraint) -> Result<Resolved>;

    /// Ensure a checkout of `url` at exactly `revision` exists at `target`.
    ///
    /// Creates the checkout when absent; when a checkout is already present
    /// it is moved to the pinned revision in place, ending detached from any
    /// mutable branch. A failed fresh checkout must leave no partial tree at
    /// `target`.
    fn checkout(&self, url: &str, revision: &str, target: &Path) -> Result<()>;

    /// Report the revision an existing checkout is at
    fn current_revision(&self, target: &Path) -> Result<String>;
}

/// Selects the backend implementation for a dependency's VCS kind
pub trait VcsProvider: Send + Sync {
    fn backend(&self, kind: VcsKind) -> &dyn Vcs;
}

/// The production backend set, one implementation per kind
pub struct Backends {
    git: GitBackend,
    hg: CommandBackend,
    svn: CommandBackend,
    bzr: CommandBackend,
}

impl Backends {
    pub fn new(cache: Cache) -> Self {
        Self {
            git: GitBackend::new(cache.clone()),
            hg: CommandBackend::new(VcsKind::Hg, cache.clone()),
            svn: CommandBackend::new(VcsKind::Svn, cache.clone()),
            bzr: CommandBackend::new(VcsKind::Bzr, cache),
        }
    }
}

impl VcsProvider for Backends {
    fn backend(&self, kind: VcsKind) -> &dyn Vcs {
        match kind {
            VcsKind::Git => &self.git,
            VcsKind::Hg => &self.hg,
            VcsKind::Svn => &self.svn,
            VcsKind::Bzr => &self.bzr,
        }
    }
}

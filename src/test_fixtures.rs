//! Test fixtures and utilities for reducing test setup duplication.
//!
//! Provides temp directory and git repository helpers plus [`FakeVcs`], a
//! scripted VCS backend that simulates reference resolution and checkouts
//! on the local filesystem without any network access.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use tempfile::TempDir;

use crate::error::{Result, VendraError};
use crate::manifest::{Constraint, MANIFEST_FILE};
use crate::vcs::{Resolved, Vcs, VcsKind, VcsProvider};

/// Marker file a fake checkout stores its revision in
const FAKE_REVISION_FILE: &str = ".fake-revision";

/// Create a temp directory that cleans up on drop.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Write `content` to `name` in the repository work dir and commit it.
///
/// Returns the new commit id. Handles both the initial commit and
/// follow-ups with a parent.
///
/// # Panics
///
/// Panics if any git operation fails.
pub fn commit_file(
    repo: &git2::Repository,
    name: &str,
    content: &str,
    message: &str,
) -> git2::Oid {
    let workdir = repo.workdir().expect("repository has a work dir");
    std::fs::write(workdir.join(name), content).expect("Failed to write file");

    let mut index = repo.index().expect("Failed to open index");
    index
        .add_path(Path::new(name))
        .expect("Failed to add file to index");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");

    let sig = git2::Signature::now("Test", "test@test.com").expect("Failed to create signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to commit")
}

/// Create a lightweight tag pointing at HEAD.
///
/// # Panics
///
/// Panics if HEAD cannot be resolved or the tag cannot be created.
pub fn tag_head(repo: &git2::Repository, name: &str) {
    let commit = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .expect("Failed to resolve HEAD");
    repo.tag_lightweight(name, commit.as_object(), false)
        .expect("Failed to create tag");
}

/// Scripted VCS backend for resolver and installer tests.
///
/// Resolutions are keyed by `(url, constraint display)`. Checkouts create
/// the target directory with a revision marker file and, when scripted,
/// a manifest for the resolver to inspect.
#[derive(Default)]
pub struct FakeVcs {
    resolutions: Mutex<HashMap<(String, String), Resolved>>,
    manifests: Mutex<HashMap<(String, String), String>>,
    failing: Mutex<HashSet<String>>,
    checkouts: Mutex<usize>,
}

impl FakeVcs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the resolution of `(url, constraint)` to a revision
    pub fn script(&self, url: &str, constraint: &str, revision: &str, reference: Option<&str>) {
        self.resolutions.lock().expect("lock poisoned").insert(
            (url.to_string(), constraint.to_string()),
            Resolved {
                revision: revision.to_string(),
                reference: reference.map(str::to_string),
            },
        );
    }

    /// Script the manifest a checkout of `(url, revision)` contains
    pub fn manifest(&self, url: &str, revision: &str, yaml: &str) {
        self.manifests
            .lock()
            .expect("lock poisoned")
            .insert((url.to_string(), revision.to_string()), yaml.to_string());
    }

    /// Make every operation against `url` fail
    pub fn fail_url(&self, url: &str) {
        self.failing
            .lock()
            .expect("lock poisoned")
            .insert(url.to_string());
    }

    /// Number of checkout operations performed so far
    pub fn checkout_count(&self) -> usize {
        *self.checkouts.lock().expect("lock poisoned")
    }
}

impl Vcs for FakeVcs {
    fn resolve_reference(&self, url: &str, constraint: &Constraint) -> Result<Resolved> {
        if self.failing.lock().expect("lock poisoned").contains(url) {
            return Err(VendraError::CloneFailed {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        self.resolutions
            .lock()
            .expect("lock poisoned")
            .get(&(url.to_string(), constraint.to_string()))
            .cloned()
            .ok_or_else(|| VendraError::ReferenceResolveFailed {
                name: url.to_string(),
                reference: constraint.to_string(),
                reason: "no scripted resolution".to_string(),
            })
    }

    fn checkout(&self, url: &str, revision: &str, target: &Path) -> Result<()> {
        if self.failing.lock().expect("lock poisoned").contains(url) {
            return Err(VendraError::CheckoutFailed {
                name: url.to_string(),
                revision: revision.to_string(),
                reason: "scripted failure".to_string(),
            });
        }

        *self.checkouts.lock().expect("lock poisoned") += 1;
        std::fs::create_dir_all(target)?;
        std::fs::write(target.join(FAKE_REVISION_FILE), revision)?;
        if let Some(yaml) = self
            .manifests
            .lock()
            .expect("lock poisoned")
            .get(&(url.to_string(), revision.to_string()))
        {
            std::fs::write(target.join(MANIFEST_FILE), yaml)?;
        }
        Ok(())
    }

    fn current_revision(&self, target: &Path) -> Result<String> {
        std::fs::read_to_string(target.join(FAKE_REVISION_FILE))
            .map(|s| s.trim().to_string())
            .map_err(|e| VendraError::RevisionLookupFailed {
                path: target.display().to_string(),
                reason: e.to_string(),
            })
    }
}

impl VcsProvider for FakeVcs {
    fn backend(&self, _kind: VcsKind) -> &dyn Vcs {
        self
    }
}

//! Git backend built on libgit2
//!
//! Sources are kept as bare repositories in the shared download cache with
//! every branch mirrored under `refs/heads/*`, so vendor checkouts cloned
//! from the cache see all branches and tags. Each cached source is fetched
//! at most once per run. Vendor checkouts are cheap local clones of the
//! cached copy, pinned to a detached revision. Authentication is delegated
//! to git's native system (SSH keys, agent, credential helpers).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use git2::{
    AutotagOption, Cred, CredentialType, ErrorClass, FetchOptions, RemoteCallbacks, Repository,
    build::RepoBuilder,
};

use crate::cache::Cache;
use crate::error::{Result, VendraError};
use crate::manifest::Constraint;
use crate::manifest::constraint::parse_tag_version;

use super::{Resolved, Vcs};

/// Refspec mirroring remote branches into the bare cache
const CACHE_REFSPEC: &str = "+refs/heads/*:refs/heads/*";

/// Refspec used when refreshing a vendor checkout from the cache
const CHECKOUT_REFSPEC: &str = "+refs/heads/*:refs/remotes/origin/*";

/// Git implementation of the VCS capability
pub struct GitBackend {
    cache: Cache,
    /// Cache paths already fetched during this run
    fetched: Mutex<HashSet<PathBuf>>,
}

impl GitBackend {
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            fetched: Mutex::new(HashSet::new()),
        }
    }

    /// Open the bare cache repository for `url`, cloning it first if absent
    fn cached_repo(&self, url: &str) -> Result<(Repository, PathBuf)> {
        let path = self.cache.source_path(url);
        if !path.join("HEAD").exists() {
            if path.exists() {
                // Leftover of an interrupted clone
                fs::remove_dir_all(&path)?;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let repo = self.clone_bare(url, &path)?;
            self.mark_fetched(&path);
            return Ok((repo, path));
        }
        let repo = open(&path)?;
        Ok((repo, path))
    }

    /// Mirror-clone `url` into a bare repository at `target`
    fn clone_bare(&self, url: &str, target: &Path) -> Result<Repository> {
        let result = (|| -> std::result::Result<Repository, git2::Error> {
            let repo = Repository::init_bare(target)?;
            {
                let mut remote = repo.remote_with_fetch("origin", url, CACHE_REFSPEC)?;
                remote.fetch(&[CACHE_REFSPEC], Some(&mut fetch_options()), None)?;

                let default_branch = remote
                    .default_branch()
                    .ok()
                    .and_then(|b| b.as_str().map(str::to_string))
                    .or_else(|| first_head(&repo));
                if let Some(name) = default_branch {
                    repo.set_head(&name)?;
                }
            }
            Ok(repo)
        })();

        result.map_err(|e| {
            let _ = fs::remove_dir_all(target);
            VendraError::CloneFailed {
                url: url.to_string(),
                reason: interpret_git_error(&e),
            }
        })
    }

    /// Fetch the cached source once per run; later calls are no-ops
    fn ensure_fresh(&self, repo: &Repository, path: &Path, url: &str) -> Result<()> {
        if !self.mark_fetched(path) {
            return Ok(());
        }
        fetch(repo, url, CACHE_REFSPEC)
    }

    /// Record a fetch of `path`; returns false when already recorded
    fn mark_fetched(&self, path: &Path) -> bool {
        self.fetched
            .lock()
            .map(|mut fetched| fetched.insert(path.to_path_buf()))
            .unwrap_or(false)
    }

    fn resolve_in(&self, repo: &Repository, url: &str, constraint: &Constraint) -> Result<Resolved> {
        let fail = |reference: &str, reason: String| VendraError::ReferenceResolveFailed {
            name: url.to_string(),
            reference: reference.to_string(),
            reason,
        };

        match constraint {
            Constraint::Default => {
                let reference = head_branch_name(repo);
                let commit = repo
                    .head()
                    .and_then(|h| h.peel_to_commit())
                    .map_err(|e| fail("HEAD", e.message().to_string()))?;
                Ok(Resolved {
                    revision: commit.id().to_string(),
                    reference,
                })
            }
            Constraint::Revision(rev) => {
                let commit = repo
                    .revparse_single(rev)
                    .and_then(|obj| obj.peel_to_commit())
                    .map_err(|e| fail(rev, e.message().to_string()))?;
                Ok(Resolved {
                    revision: commit.id().to_string(),
                    reference: None,
                })
            }
            Constraint::Reference(name) => {
                let commit = resolve_symbolic(repo, name)
                    .ok_or_else(|| fail(name, "could not resolve reference".to_string()))?;
                Ok(Resolved {
                    revision: commit.id().to_string(),
                    reference: Some(name.clone()),
                })
            }
            Constraint::Range(req) => {
                let tag = best_matching_tag(repo, constraint).ok_or_else(|| {
                    fail(
                        &req.to_string(),
                        "no tag satisfies the version range".to_string(),
                    )
                })?;
                let commit = resolve_symbolic(repo, &tag)
                    .ok_or_else(|| fail(&tag, "tag did not resolve to a commit".to_string()))?;
                Ok(Resolved {
                    revision: commit.id().to_string(),
                    reference: Some(tag),
                })
            }
        }
    }

    /// Make sure `revision` is present in the cached copy, fetching if not
    fn ensure_revision_cached(&self, repo: &Repository, url: &str, revision: &str) -> Result<()> {
        if repo.revparse_single(revision).is_ok() {
            return Ok(());
        }
        fetch(repo, url, CACHE_REFSPEC)?;
        repo.revparse_single(revision)
            .map(|_| ())
            .map_err(|e| VendraError::CheckoutFailed {
                name: url.to_string(),
                revision: revision.to_string(),
                reason: interpret_git_error(&e),
            })
    }
}

impl Vcs for GitBackend {
    fn resolve_reference(&self, url: &str, constraint: &Constraint) -> Result<Resolved> {
        let (repo, path) = self.cached_repo(url)?;

        // A failed refresh only matters when the cached copy cannot answer;
        // resolving against the cache keeps offline installs working.
        let refresh = self.ensure_fresh(&repo, &path, url);
        match self.resolve_in(&repo, url, constraint) {
            Ok(resolved) => Ok(resolved),
            Err(resolve_err) => match refresh {
                Err(refresh_err) => Err(refresh_err),
                Ok(()) => Err(resolve_err),
            },
        }
    }

    fn checkout(&self, url: &str, revision: &str, target: &Path) -> Result<()> {
        if target.join(".git").exists() {
            // Existing checkout: pin in place, fetching from the cache if needed
            let repo = open(target)?;
            if repo.revparse_single(revision).is_err() {
                let (cache_repo, _path) = self.cached_repo(url)?;
                self.ensure_revision_cached(&cache_repo, url, revision)?;
                fetch(&repo, url, CHECKOUT_REFSPEC)?;
            }
            return checkout_detached(&repo, url, revision);
        }

        let (cache_repo, cache_path) = self.cached_repo(url)?;
        self.ensure_revision_cached(&cache_repo, url, revision)?;

        // Clone into a staging directory and rename into place so a failed
        // checkout never leaves a partial tree at the target path.
        let staging = staging_path(target)?;
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let cache_url = cache_path.to_string_lossy().to_string();
        let result =
            clone(&cache_url, &staging).and_then(|repo| checkout_detached(&repo, url, revision));
        if let Err(err) = result {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }

        if target.exists() {
            fs::remove_dir_all(target)?;
        }
        fs::rename(&staging, target)?;
        Ok(())
    }

    fn current_revision(&self, target: &Path) -> Result<String> {
        let repo = Repository::open(target).map_err(|e| VendraError::RevisionLookupFailed {
            path: target.display().to_string(),
            reason: e.message().to_string(),
        })?;
        let commit = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| VendraError::RevisionLookupFailed {
                path: target.display().to_string(),
                reason: e.message().to_string(),
            })?;
        Ok(commit.id().to_string())
    }
}

/// Pick a head for a freshly mirrored repository when the remote does not
/// advertise a default branch
fn first_head(repo: &Repository) -> Option<String> {
    for name in ["refs/heads/main", "refs/heads/master"] {
        if repo.find_reference(name).is_ok() {
            return Some(name.to_string());
        }
    }
    repo.references_glob("refs/heads/*")
        .ok()?
        .names()
        .next()?
        .ok()
        .map(str::to_string)
}

/// Staging path used while a fresh checkout is assembled
fn staging_path(target: &Path) -> Result<PathBuf> {
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| VendraError::IoError {
            message: format!("invalid checkout target: {}", target.display()),
        })?;
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(format!(".{name}.partial")))
}

/// Fetch options with authentication callbacks and full tag download
fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options.download_tags(AutotagOption::All);
    options
}

/// Fetch `refspec` from the repository's origin remote
fn fetch(repo: &Repository, url: &str, refspec: &str) -> Result<()> {
    repo.find_remote("origin")
        .and_then(|mut remote| remote.fetch(&[refspec], Some(&mut fetch_options()), None))
        .map_err(|e| VendraError::FetchFailed {
            url: url.to_string(),
            reason: interpret_git_error(&e),
        })
}

/// Normalize SSH URLs from SCP-style (git@host:path) to ssh:// format.
///
/// libgit2 may have issues with SCP-style SSH URLs, so we convert them to
/// the explicit ssh:// format for better compatibility.
fn normalize_ssh_url(url: &str) -> std::borrow::Cow<'_, str> {
    if !url.starts_with("git@") || url.starts_with("ssh://") {
        return std::borrow::Cow::Borrowed(url);
    }

    if let Some(colon_pos) = url.find(':') {
        let host_part = &url[..colon_pos];
        let path_part = &url[colon_pos + 1..];
        let normalized_path = if path_part.starts_with('/') {
            path_part.to_string()
        } else {
            format!("/{}", path_part)
        };
        return std::borrow::Cow::Owned(format!("ssh://{}{}", host_part, normalized_path));
    }

    std::borrow::Cow::Borrowed(url)
}

/// Interpret a git2 error and provide a more user-friendly message
fn interpret_git_error(err: &git2::Error) -> String {
    let class = err.class();
    let message = err.message().to_lowercase();

    if message.contains("not found") || message.contains("404") {
        "Repository not found".to_string()
    } else if message.contains("authentication") || message.contains("credentials") {
        "Authentication failed".to_string()
    } else if message.contains("connection")
        || message.contains("network")
        || message.contains("timeout")
        || message.contains("timed out")
    {
        "Network error".to_string()
    } else if class == ErrorClass::Http {
        format!("HTTP error: {}", err.message())
    } else if class == ErrorClass::Ssh {
        format!("SSH error: {}", err.message())
    } else {
        err.message().to_string()
    }
}

/// Clone a git repository to a target directory
fn clone(url: &str, target: &Path) -> Result<Repository> {
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options());

    let url_to_clone = normalize_ssh_url(url);
    builder
        .clone(url_to_clone.as_ref(), target)
        .map_err(|e| VendraError::CloneFailed {
            url: url.to_string(),
            reason: interpret_git_error(&e),
        })
}

/// Open an existing repository
fn open(path: &Path) -> Result<Repository> {
    Repository::open(path).map_err(|e| VendraError::GitOperationFailed {
        message: format!("{}: {}", path.display(), e.message()),
    })
}

/// Resolve a reference name (tag, branch, remote ref, or SHA prefix) to a
/// commit. Tags and remote-tracking refs are tried before local heads,
/// which can lag behind after a fetch into a non-bare checkout.
fn resolve_symbolic<'a>(repo: &'a Repository, refname: &str) -> Option<git2::Commit<'a>> {
    let candidates = [
        refname.to_string(),
        format!("refs/tags/{}", refname),
        format!("refs/remotes/origin/{}", refname),
        format!("refs/heads/{}", refname),
    ];

    for candidate in &candidates {
        if let Ok(reference) = repo.find_reference(candidate) {
            if let Ok(commit) = reference.peel_to_commit() {
                return Some(commit);
            }
        }
    }

    if let Ok(obj) = repo.revparse_single(refname) {
        if let Ok(commit) = obj.peel_to_commit() {
            return Some(commit);
        }
    }

    None
}

/// Pick the highest tag satisfying a version range constraint
fn best_matching_tag(repo: &Repository, constraint: &Constraint) -> Option<String> {
    let tags = repo.tag_names(None).ok()?;
    tags.iter()
        .flatten()
        .filter_map(|tag| parse_tag_version(tag).map(|v| (v, tag.to_string())))
        .filter(|(version, _)| constraint.allows(version))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, tag)| tag)
}

/// Move a checkout to a detached state at the given revision
fn checkout_detached(repo: &Repository, url: &str, revision: &str) -> Result<()> {
    let fail = |reason: String| VendraError::CheckoutFailed {
        name: url.to_string(),
        revision: revision.to_string(),
        reason,
    };

    let commit = repo
        .revparse_single(revision)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|e| fail(e.message().to_string()))?;

    repo.set_head_detached(commit.id())
        .map_err(|e| fail(e.message().to_string()))?;

    let mut checkout_builder = git2::build::CheckoutBuilder::new();
    checkout_builder.force();
    repo.checkout_head(Some(&mut checkout_builder))
        .map_err(|e| fail(e.message().to_string()))?;

    Ok(())
}

/// Get the symbolic name of HEAD (e.g., "main", "master"), None if detached
fn head_branch_name(repo: &Repository) -> Option<String> {
    let head = repo.head().ok()?;
    if head.is_branch() {
        head.shorthand().map(str::to_string)
    } else {
        None
    }
}

/// Set up authentication callbacks for git operations
///
/// Delegates to git's native credential system: SSH agent, keys in ~/.ssh,
/// credential helpers, and anonymous access for public repositories.
fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks) {
    callbacks.credentials(|url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(username) = username_from_url {
                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }

                let home = dirs::home_dir().unwrap_or_default();
                let ssh_dir = home.join(".ssh");
                for key_name in &["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let private_key = ssh_dir.join(key_name);
                    if private_key.exists() {
                        let public_key = ssh_dir.join(format!("{}.pub", key_name));
                        let public_key_path = public_key.exists().then_some(public_key.as_path());
                        if let Ok(cred) =
                            Cred::ssh_key(username, public_key_path, &private_key, None)
                        {
                            return Ok(cred);
                        }
                    }
                }
            }
        }

        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Ok(config) = git2::Config::open_default() {
                if let Ok(cred) = Cred::credential_helper(&config, url, username_from_url) {
                    return Ok(cred);
                }
            }
            if let Ok(cred) = Cred::userpass_plaintext("", "") {
                return Ok(cred);
            }
        }

        Err(git2::Error::new(
            git2::ErrorCode::Auth,
            git2::ErrorClass::Http,
            "authentication failed",
        ))
    });
}

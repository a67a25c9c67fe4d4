//! Command-line backends for non-git version control systems
//!
//! libgit2 covers git; mercurial, subversion and bzr checkouts go through
//! their system binaries. The shape mirrors the git backend: distributed
//! backends (hg, bzr) clone into the shared cache and branch vendor
//! checkouts from it, while svn checks out working copies straight from
//! the repository URL.

use std::path::Path;
use std::process::Command;

use crate::cache::Cache;
use crate::error::{Result, VendraError};
use crate::manifest::Constraint;
use crate::manifest::constraint::parse_tag_version;

use super::{Resolved, Vcs, VcsKind};

/// VCS capability implemented by shelling out to a backend's binary
pub struct CommandBackend {
    kind: VcsKind,
    cache: Cache,
}

impl CommandBackend {
    pub fn new(kind: VcsKind, cache: Cache) -> Self {
        Self { kind, cache }
    }

    /// Run the backend binary, mapping a missing binary to a backend error
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        let mut command = Command::new(self.kind.as_str());
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VendraError::BackendUnavailable {
                    kind: self.kind,
                    reason: format!("'{}' binary not found on PATH", self.kind),
                }
            } else {
                VendraError::IoError {
                    message: e.to_string(),
                }
            }
        })?;

        if !output.status.success() {
            return Err(VendraError::CacheOperationFailed {
                message: format!(
                    "{} {} failed: {}",
                    self.kind,
                    args.first().copied().unwrap_or_default(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Clone `url` into the shared cache if not already present
    fn ensure_cached(&self, url: &str) -> Result<std::path::PathBuf> {
        let path = self.cache.source_path(url);
        if path.join(self.kind.metadata_dir()).exists() {
            let pull: &[&str] = match self.kind {
                VcsKind::Hg => &["pull"],
                VcsKind::Svn => &["update"],
                VcsKind::Bzr => &["pull"],
                VcsKind::Git => unreachable!("git uses the libgit2 backend"),
            };
            // Best effort; the cached copy may already hold the revision
            let _ = self.run(pull, Some(&path));
            return Ok(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let path_str = path.to_string_lossy().to_string();
        let clone: Vec<&str> = match self.kind {
            VcsKind::Hg => vec!["clone", url, path_str.as_str()],
            VcsKind::Svn => vec!["checkout", url, path_str.as_str()],
            VcsKind::Bzr => vec!["branch", url, path_str.as_str()],
            VcsKind::Git => unreachable!("git uses the libgit2 backend"),
        };
        self.run(&clone, None).map_err(|e| match e {
            VendraError::BackendUnavailable { .. } => e,
            other => VendraError::CloneFailed {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })?;
        Ok(path)
    }

    /// Resolve a symbolic name to an identifier in a cached copy
    fn identify(&self, workdir: &Path, reference: Option<&str>) -> Result<String> {
        match self.kind {
            VcsKind::Hg => self.run(
                &[
                    "log",
                    "-r",
                    reference.unwrap_or("tip"),
                    "-l",
                    "1",
                    "--template",
                    "{node}",
                ],
                Some(workdir),
            ),
            VcsKind::Svn => match reference {
                Some(rev) => Ok(rev.to_string()),
                None => self.run(&["info", "--show-item", "revision"], Some(workdir)),
            },
            VcsKind::Bzr => {
                let output = match reference {
                    Some(r) => self.run(&["revision-info", "-r", r], Some(workdir))?,
                    None => self.run(&["revision-info"], Some(workdir))?,
                };
                // "revno revid"; the revid is the stable identifier
                output
                    .split_whitespace()
                    .nth(1)
                    .map(str::to_string)
                    .ok_or_else(|| VendraError::CacheOperationFailed {
                        message: format!("unexpected bzr revision-info output: {output}"),
                    })
            }
            VcsKind::Git => unreachable!("git uses the libgit2 backend"),
        }
    }

    /// List tags of a cached copy as (version, tag name) pairs
    fn versioned_tags(&self, workdir: &Path) -> Result<Vec<(semver::Version, String)>> {
        let listing = match self.kind {
            VcsKind::Hg => self.run(&["tags"], Some(workdir))?,
            VcsKind::Bzr => self.run(&["tags"], Some(workdir))?,
            _ => return Ok(Vec::new()),
        };
        Ok(listing
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .filter_map(|tag| parse_tag_version(tag).map(|v| (v, tag.to_string())))
            .collect())
    }

    fn update_to(&self, workdir: &Path, revision: &str) -> Result<()> {
        let args: Vec<&str> = match self.kind {
            VcsKind::Hg => vec!["update", "-r", revision, "--clean"],
            VcsKind::Svn => vec!["update", "-r", revision],
            VcsKind::Bzr => vec!["update", "-r", revision],
            VcsKind::Git => unreachable!("git uses the libgit2 backend"),
        };
        self.run(&args, Some(workdir)).map(|_| ())
    }
}

impl Vcs for CommandBackend {
    fn resolve_reference(&self, url: &str, constraint: &Constraint) -> Result<Resolved> {
        // svn revisions are queried against the URL; no cached copy needed
        if self.kind == VcsKind::Svn {
            return match constraint {
                Constraint::Revision(rev) => Ok(Resolved {
                    revision: rev.clone(),
                    reference: None,
                }),
                Constraint::Default => {
                    let revision =
                        self.run(&["info", "--show-item", "last-changed-revision", url], None)?;
                    Ok(Resolved {
                        revision,
                        reference: None,
                    })
                }
                other => Err(VendraError::ReferenceResolveFailed {
                    name: url.to_string(),
                    reference: other.to_string(),
                    reason: "svn supports only numeric revisions".to_string(),
                }),
            };
        }

        let workdir = self.ensure_cached(url)?;
        let fail = |reference: String, reason: String| VendraError::ReferenceResolveFailed {
            name: url.to_string(),
            reference,
            reason,
        };

        match constraint {
            Constraint::Default => Ok(Resolved {
                revision: self.identify(&workdir, None)?,
                reference: None,
            }),
            Constraint::Revision(rev) => Ok(Resolved {
                revision: self.identify(&workdir, Some(rev))?,
                reference: None,
            }),
            Constraint::Reference(name) => Ok(Resolved {
                revision: self
                    .identify(&workdir, Some(name))
                    .map_err(|e| fail(name.clone(), e.to_string()))?,
                reference: Some(name.clone()),
            }),
            Constraint::Range(req) => {
                let tag = self
                    .versioned_tags(&workdir)?
                    .into_iter()
                    .filter(|(version, _)| constraint.allows(version))
                    .max_by(|(a, _), (b, _)| a.cmp(b))
                    .map(|(_, tag)| tag)
                    .ok_or_else(|| {
                        fail(
                            req.to_string(),
                            "no tag satisfies the version range".to_string(),
                        )
                    })?;
                Ok(Resolved {
                    revision: self.identify(&workdir, Some(&tag))?,
                    reference: Some(tag),
                })
            }
        }
    }

    fn checkout(&self, url: &str, revision: &str, target: &Path) -> Result<()> {
        if target.join(self.kind.metadata_dir()).exists() {
            return self.update_to(target, revision).map_err(|e| {
                VendraError::CheckoutFailed {
                    name: url.to_string(),
                    revision: revision.to_string(),
                    reason: e.to_string(),
                }
            });
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let target_str = target.to_string_lossy().to_string();

        let result = match self.kind {
            VcsKind::Hg => {
                let source = self.ensure_cached(url)?;
                let source_str = source.to_string_lossy().to_string();
                self.run(&["clone", "-r", revision, source_str.as_str(), target_str.as_str()], None)
                    .map(|_| ())
            }
            VcsKind::Svn => self
                .run(&["checkout", "-r", revision, url, target_str.as_str()], None)
                .map(|_| ()),
            VcsKind::Bzr => {
                let source = self.ensure_cached(url)?;
                let source_str = source.to_string_lossy().to_string();
                self.run(&["branch", "-r", revision, source_str.as_str(), target_str.as_str()], None)
                    .map(|_| ())
            }
            VcsKind::Git => unreachable!("git uses the libgit2 backend"),
        };

        result.map_err(|e| match e {
            VendraError::BackendUnavailable { .. } => e,
            other => {
                // A failed fresh checkout must not leave a partial tree
                let _ = std::fs::remove_dir_all(target);
                VendraError::CheckoutFailed {
                    name: url.to_string(),
                    revision: revision.to_string(),
                    reason: other.to_string(),
                }
            }
        })
    }

    fn current_revision(&self, target: &Path) -> Result<String> {
        self.identify(target, None)
            .map_err(|e| VendraError::RevisionLookupFailed {
                path: target.display().to_string(),
                reason: e.to_string(),
            })
    }
}

//! Dependency resolution
//!
//! The resolver walks the dependency graph breadth-first from the
//! manifest's direct imports. Each dependency is resolved to a concrete
//! revision through the VCS capability, its own manifest (if any) is
//! inspected from a temporary checkout, and its imports are enqueued.
//! Import paths are memoized in the resolved map, so a package is resolved
//! once and cycles terminate on the membership check alone.
//!
//! When two paths through the graph constrain the same import, the
//! requirement closer to the root dominates as long as its revision still
//! satisfies the other constraint; otherwise resolution fails with a
//! conflict naming the import path and both competing constraints.

use std::collections::{HashMap, VecDeque};

use crate::error::{Result, VendraError};
use crate::lockfile::{LockedImport, Lockfile};
use crate::manifest::{Constraint, Dependency, MANIFEST_FILE, Manifest};
use crate::vcs::{Resolved, VcsProvider};

/// One declared requirement on an import path
#[derive(Debug, Clone)]
struct Requirement {
    constraint: Constraint,
    required_by: String,
    depth: usize,
}

/// A package pinned during this resolution, with the requirement that won
struct ResolvedEntry {
    import: LockedImport,
    resolution: Resolved,
    winner: Requirement,
}

/// A dependency waiting in the traversal queue
struct Pending {
    dep: Dependency,
    required_by: String,
    depth: usize,
}

/// Dependency resolver producing a lockfile from a manifest
pub struct Resolver<'a> {
    vcs: &'a dyn VcsProvider,
    resolved: HashMap<String, ResolvedEntry>,
}

impl<'a> Resolver<'a> {
    pub fn new(vcs: &'a dyn VcsProvider) -> Self {
        Self {
            vcs,
            resolved: HashMap::new(),
        }
    }

    /// Resolve the manifest's transitive dependency graph into a lockfile.
    ///
    /// Deterministic for a fixed manifest and fixed backend responses: the
    /// resulting lockfile carries the same package set, revisions and
    /// serialized ordering on every run.
    pub fn resolve(&mut self, manifest: &Manifest) -> Result<Lockfile> {
        self.resolved.clear();

        let mut queue: VecDeque<Pending> = manifest
            .imports
            .iter()
            .cloned()
            .map(|dep| Pending {
                dep,
                required_by: manifest.package.clone(),
                depth: 0,
            })
            .collect();

        while let Some(pending) = queue.pop_front() {
            let name = pending.dep.package.clone();
            let requirement = Requirement {
                constraint: pending.dep.constraint()?,
                required_by: pending.required_by.clone(),
                depth: pending.depth,
            };

            if self.resolved.contains_key(&name) {
                if let Some(switched) = self.reconcile(&name, &pending.dep, requirement)? {
                    // Narrowing re-pinned the revision; the sub-manifest at
                    // the new revision may declare a different import set.
                    self.inspect_submanifest(
                        &pending.dep,
                        &switched.revision,
                        pending.depth,
                        &mut queue,
                    )?;
                }
                continue;
            }

            let url = pending.dep.repo_url();
            let kind = pending.dep.vcs_kind();
            let resolution = self
                .vcs
                .backend(kind)
                .resolve_reference(&url, &requirement.constraint)
                .map_err(|e| attribute(&name, &requirement.constraint, e))?;

            let revision = resolution.revision.clone();
            self.resolved.insert(
                name.clone(),
                ResolvedEntry {
                    import: LockedImport {
                        name: name.clone(),
                        repo: url,
                        vcs: kind,
                        revision: revision.clone(),
                        subpackages: sorted_subpackages(&pending.dep),
                    },
                    resolution,
                    winner: requirement,
                },
            );

            self.inspect_submanifest(&pending.dep, &revision, pending.depth, &mut queue)?;
        }

        let mut lock = Lockfile::new(manifest.content_hash());
        for entry in self.resolved.values() {
            lock.add(entry.import.clone());
        }
        Ok(lock)
    }

    /// Reconcile a repeated requirement against the already-pinned entry.
    ///
    /// Returns the new resolution when narrowing replaced the pinned
    /// revision, `None` when the existing pin already satisfies the
    /// incoming requirement.
    fn reconcile(
        &mut self,
        name: &str,
        dep: &Dependency,
        incoming: Requirement,
    ) -> Result<Option<Resolved>> {
        let entry = match self.resolved.get_mut(name) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        merge_subpackages(&mut entry.import.subpackages, dep);

        if incoming.constraint == entry.winner.constraint
            || incoming.constraint.accepts(&entry.resolution)
        {
            return Ok(None);
        }

        let incoming_resolution = self
            .vcs
            .backend(entry.import.vcs)
            .resolve_reference(&entry.import.repo, &incoming.constraint)
            .map_err(|e| attribute(name, &incoming.constraint, e))?;

        // Converged on the same revision despite differing constraints
        if incoming_resolution.revision == entry.resolution.revision {
            return Ok(None);
        }

        // A requirement closer to the root dominates, provided its pick
        // still satisfies the constraint that held the pin so far.
        if incoming.depth < entry.winner.depth
            && entry.winner.constraint.accepts(&incoming_resolution)
        {
            entry.import.revision = incoming_resolution.revision.clone();
            entry.resolution = incoming_resolution.clone();
            entry.winner = incoming;
            return Ok(Some(incoming_resolution));
        }

        Err(VendraError::ResolutionConflict {
            name: name.to_string(),
            first_constraint: entry.winner.constraint.to_string(),
            first_requirer: entry.winner.required_by.clone(),
            second_constraint: incoming.constraint.to_string(),
            second_requirer: incoming.required_by,
        })
    }

    /// Check out the dependency at `revision` into a temporary directory
    /// and enqueue the imports of its manifest, if it carries one.
    fn inspect_submanifest(
        &self,
        dep: &Dependency,
        revision: &str,
        depth: usize,
        queue: &mut VecDeque<Pending>,
    ) -> Result<()> {
        let Some(sub) = self.submanifest(dep, revision)? else {
            return Ok(());
        };
        for import in sub.imports {
            queue.push_back(Pending {
                dep: import,
                required_by: dep.package.clone(),
                depth: depth + 1,
            });
        }
        Ok(())
    }

    fn submanifest(&self, dep: &Dependency, revision: &str) -> Result<Option<Manifest>> {
        let temp = tempfile::tempdir()?;
        let checkout = temp.path().join("src");

        self.vcs
            .backend(dep.vcs_kind())
            .checkout(&dep.repo_url(), revision, &checkout)?;

        let manifest_path = checkout.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Ok(None);
        }

        Manifest::from_file(&manifest_path)
            .map(Some)
            .map_err(|e| VendraError::ManifestInvalid {
                message: format!("{}: {}", dep.package, e),
            })
    }
}

/// Attribute a backend failure to the import path being resolved
fn attribute(name: &str, constraint: &Constraint, err: VendraError) -> VendraError {
    match err {
        VendraError::ResolutionConflict { .. } => err,
        other => VendraError::ReferenceResolveFailed {
            name: name.to_string(),
            reference: constraint.to_string(),
            reason: other.to_string(),
        },
    }
}

fn sorted_subpackages(dep: &Dependency) -> Vec<String> {
    let mut subs = dep.subpackages.clone();
    subs.sort();
    subs.dedup();
    subs
}

fn merge_subpackages(existing: &mut Vec<String>, dep: &Dependency) {
    for sub in &dep.subpackages {
        if !existing.contains(sub) {
            existing.push(sub.clone());
        }
    }
    existing.sort();
    existing.dedup();
}

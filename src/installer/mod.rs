//! Vendor tree installer
//!
//! Reconciles the on-disk vendor tree against a lockfile in four phases:
//!
//! 1. Ensure a checkout of every locked import exists at its pinned
//!    revision. Checkouts are independent per import path and run on a
//!    bounded worker pool; a failed checkout is recorded and does not
//!    abort sibling packages.
//! 2. Set references: re-pin any checkout that is not detached at its
//!    locked revision. Best effort; failures become warnings.
//! 3. Optionally delete vendor directories no lockfile import claims.
//! 4. Optionally normalize the tree: strip VCS metadata directories and
//!    nested vendor trees.
//!
//! Phases run strictly in order: every checkout finishes before reference
//! setting starts, and reference setting finishes before cleanup and
//! normalization. Phases 2-4 never abort the run; their failures are
//! reported at the end so a partially imperfect vendor tree still lands.

pub mod cleanup;
pub mod normalize;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::cache::CacheGuard;
use crate::error::{Result, VendraError};
use crate::lockfile::{LockedImport, Lockfile};
use crate::manifest::{Dependency, Manifest};
use crate::progress::ProgressDisplay;
use crate::vcs::{VcsKind, VcsProvider};

/// Default size of the checkout worker pool
pub const DEFAULT_WORKERS: usize = 8;

/// Behavior toggles for one install run
#[derive(Debug, Clone)]
pub struct InstallFlags {
    /// Delete vendor directories absent from the lockfile
    pub delete_unused: bool,
    /// Strip VCS metadata directories from the vendor tree
    pub strip_vcs: bool,
    /// Strip nested vendor and legacy workspace directories
    pub strip_vendor: bool,
    /// Guard the shared download cache for the duration of the run
    pub use_cache: bool,
    /// Worker pool size for the checkout phase
    pub workers: usize,
}

impl Default for InstallFlags {
    fn default() -> Self {
        Self {
            delete_unused: false,
            strip_vcs: false,
            strip_vendor: false,
            use_cache: true,
            workers: DEFAULT_WORKERS,
        }
    }
}

/// How the checkout phase left one package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckoutOutcome {
    /// Already present at the pinned revision; nothing touched
    UpToDate,
    /// Fetched or re-pinned during this run
    Installed,
}

/// Result of one install run
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Packages fetched or re-pinned
    pub installed: usize,
    /// Packages already at their pinned revision
    pub up_to_date: usize,
    /// Import paths removed by cleanup
    pub removed: Vec<String>,
    /// Per-package checkout failures (package, reason)
    pub failures: Vec<(String, String)>,
    /// Non-fatal reference/cleanup/normalization warnings
    pub warnings: Vec<String>,
    /// The manifest the vendor tree effectively satisfies
    pub effective: Manifest,
}

impl InstallReport {
    /// Count of everything that should make the run exit non-zero
    pub fn problem_count(&self) -> usize {
        self.failures.len() + self.warnings.len()
    }
}

/// Vendor tree installer for one run
pub struct Installer<'a> {
    vendor_root: PathBuf,
    vcs: &'a dyn VcsProvider,
    flags: InstallFlags,
    /// Held for the whole run so concurrent processes cannot corrupt the
    /// shared download cache; released on drop
    _guard: Option<CacheGuard>,
}

impl<'a> Installer<'a> {
    pub fn new(
        vendor_root: impl Into<PathBuf>,
        vcs: &'a dyn VcsProvider,
        flags: InstallFlags,
        guard: Option<CacheGuard>,
    ) -> Self {
        Self {
            vendor_root: vendor_root.into(),
            vcs,
            flags,
            _guard: guard,
        }
    }

    /// Vendor directory of an import path
    pub fn vendor_path(&self, name: &str) -> PathBuf {
        package_dir(&self.vendor_root, name)
    }

    /// Reconcile the vendor tree against `lock`.
    ///
    /// Returns a report carrying the effective manifest and everything
    /// that went wrong; only failures before the first disk mutation are
    /// returned as hard errors.
    pub fn install(&self, lock: &Lockfile, manifest: &Manifest) -> Result<InstallReport> {
        std::fs::create_dir_all(&self.vendor_root)?;

        let mut report = InstallReport {
            effective: effective_manifest(lock, manifest),
            ..InstallReport::default()
        };

        self.run_checkouts(lock, &mut report)?;
        self.set_references(lock, &mut report);

        if self.flags.delete_unused {
            match cleanup::delete_unused(&self.vendor_root, lock) {
                Ok(removed) => report.removed = removed,
                Err(e) => report.warnings.push(e.to_string()),
            }
        }

        if self.flags.strip_vendor {
            if let Err(e) = normalize::strip_nested_vendor(&self.vendor_root, lock) {
                report.warnings.push(e.to_string());
            }
        }
        if self.flags.strip_vcs {
            if let Err(e) = normalize::strip_vcs(&self.vendor_root) {
                report.warnings.push(e.to_string());
            }
        }

        Ok(report)
    }

    /// Phase 1: parallel checkouts over a bounded worker pool
    fn run_checkouts(&self, lock: &Lockfile, report: &mut InstallReport) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.flags.workers.max(1))
            .build()
            .map_err(|e| VendraError::IoError {
                message: format!("failed to start worker pool: {e}"),
            })?;

        let progress = ProgressDisplay::new(lock.imports.len() as u64);
        let results: Vec<(String, Result<CheckoutOutcome>)> = pool.install(|| {
            lock.imports
                .par_iter()
                .map(|import| {
                    let result = self.ensure_checkout(import);
                    progress.advance(&import.name);
                    (import.name.clone(), result)
                })
                .collect()
        });
        progress.finish();

        for (name, result) in results {
            match result {
                Ok(CheckoutOutcome::Installed) => report.installed += 1,
                Ok(CheckoutOutcome::UpToDate) => report.up_to_date += 1,
                Err(e) => report.failures.push((name, e.to_string())),
            }
        }
        Ok(())
    }

    /// Ensure one package is checked out at its pinned revision
    fn ensure_checkout(&self, import: &LockedImport) -> Result<CheckoutOutcome> {
        let dest = self.vendor_path(&import.name);
        let backend = self.vcs.backend(import.vcs);

        if dest.exists() {
            if let Ok(current) = backend.current_revision(&dest) {
                if current == import.revision {
                    return Ok(CheckoutOutcome::UpToDate);
                }
            }
        }

        backend.checkout(&import.repo, &import.revision, &dest)?;
        Ok(CheckoutOutcome::Installed)
    }

    /// Phase 2: leave every package detached at its pinned revision.
    ///
    /// Runs only after all checkouts completed. Failures are reported per
    /// package and the pass continues to the remaining packages.
    fn set_references(&self, lock: &Lockfile, report: &mut InstallReport) {
        for import in &lock.imports {
            let dest = self.vendor_path(&import.name);
            if !dest.exists() {
                // Checkout failed earlier; already reported
                continue;
            }

            let backend = self.vcs.backend(import.vcs);
            let pinned = matches!(
                backend.current_revision(&dest),
                Ok(revision) if revision == import.revision
            );
            if pinned {
                continue;
            }

            if let Err(e) = backend.checkout(&import.repo, &import.revision, &dest) {
                report.warnings.push(
                    VendraError::ReferenceSetFailed {
                        name: import.name.clone(),
                        revision: import.revision.clone(),
                        reason: e.to_string(),
                    }
                    .to_string(),
                );
            }
        }
    }
}

/// Vendor directory of an import path under `vendor_root`
pub(crate) fn package_dir(vendor_root: &Path, name: &str) -> PathBuf {
    name.split('/')
        .fold(vendor_root.to_path_buf(), |path, segment| path.join(segment))
}

/// The manifest a vendor tree effectively satisfies after installing `lock`
fn effective_manifest(lock: &Lockfile, manifest: &Manifest) -> Manifest {
    let imports = lock
        .imports
        .iter()
        .map(|import| Dependency {
            package: import.name.clone(),
            version: Some(import.revision.clone()),
            repo: Some(import.repo.clone()),
            vcs: (import.vcs != VcsKind::Git).then_some(import.vcs),
            subpackages: import.subpackages.clone(),
        })
        .collect();
    Manifest {
        package: manifest.package.clone(),
        imports,
    }
}

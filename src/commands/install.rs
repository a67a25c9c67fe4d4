//! Install command implementation
//!
//! Materializes the vendor tree from an existing lock artifact:
//! 1. Locate the project and load its manifest
//! 2. If no lock file exists, fall through to a full update, because
//!    installation without a pin set is meaningless
//! 3. Load the lock file (corrupt lock is fatal) and warn when its hash
//!    no longer matches the manifest; staleness never blocks the run
//! 4. Acquire the cache guard and run the installer

use std::path::PathBuf;

use crate::cache::{Cache, CacheGuard};
use crate::cli::InstallArgs;
use crate::commands::update;
use crate::error::{Result, VendraError};
use crate::installer::{InstallFlags, InstallReport, Installer};
use crate::lockfile::Lockfile;
use crate::manifest::Manifest;
use crate::ui;
use crate::vcs::Backends;
use crate::workspace::Project;

pub fn run(workspace: Option<PathBuf>, args: InstallArgs) -> Result<()> {
    let project = Project::find(workspace)?;
    let manifest = project.load_manifest()?;
    let flags = args.to_flags();

    if !project.has_lock() {
        ui::info("Lock file (vendra.lock) does not exist. Performing update.");
        return update::perform(&project, &manifest, flags);
    }

    let lock = Lockfile::from_file(&project.lock_path())?;
    if lock.is_stale(&manifest) {
        ui::warn(
            "Lock file may be out of date. Hash check against vendra.yaml failed. \
             You may need to run 'vendra update'.",
        );
    }

    perform(&project, &manifest, &lock, flags)
}

/// Run the installer against a lockfile; shared by install and update
pub(crate) fn perform(
    project: &Project,
    manifest: &Manifest,
    lock: &Lockfile,
    flags: InstallFlags,
) -> Result<()> {
    let cache = Cache::new()?;
    let guard = if flags.use_cache {
        Some(CacheGuard::acquire(&cache)?)
    } else {
        None
    };
    let backends = Backends::new(cache);

    let installer = Installer::new(project.vendor_path(), &backends, flags, guard);
    let report = installer.install(lock, manifest)?;
    summarize(&report)
}

/// Print the run report; any failure or warning makes the exit non-zero
pub(crate) fn summarize(report: &InstallReport) -> Result<()> {
    for (name, reason) in &report.failures {
        ui::error(&format!("Failed to install {name}: {reason}"));
    }
    for warning in &report.warnings {
        ui::warn(warning);
    }
    if !report.removed.is_empty() {
        ui::info(&format!(
            "Removed {} unused package(s).",
            report.removed.len()
        ));
    }
    ui::info(&format!(
        "{} package(s) installed, {} already up to date.",
        report.installed, report.up_to_date
    ));

    let problems = report.problem_count();
    if problems > 0 {
        return Err(VendraError::CompletedWithWarnings { count: problems });
    }
    Ok(())
}

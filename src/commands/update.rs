//! Update command implementation
//!
//! Always resolves the dependency graph fresh from the live manifest,
//! persists the resulting lock file, then proceeds into the same installer
//! invocation the install command ends in. The cache guard is taken before
//! resolution starts since resolution already populates the shared cache.

use std::path::PathBuf;

use crate::cache::{Cache, CacheGuard};
use crate::cli::UpdateArgs;
use crate::commands::install;
use crate::error::Result;
use crate::installer::{InstallFlags, Installer};
use crate::manifest::Manifest;
use crate::resolver::Resolver;
use crate::ui;
use crate::vcs::Backends;
use crate::workspace::Project;

pub fn run(workspace: Option<PathBuf>, args: UpdateArgs) -> Result<()> {
    let project = Project::find(workspace)?;
    let manifest = project.load_manifest()?;
    perform(&project, &manifest, args.to_flags())
}

/// Resolve, persist the lock, and install
pub(crate) fn perform(project: &Project, manifest: &Manifest, flags: InstallFlags) -> Result<()> {
    let cache = Cache::new()?;
    let guard = if flags.use_cache {
        Some(CacheGuard::acquire(&cache)?)
    } else {
        None
    };
    let backends = Backends::new(cache);

    ui::info("Resolving dependency graph...");
    let lock = Resolver::new(&backends).resolve(manifest)?;
    lock.write_to(&project.lock_path())?;
    ui::info(&format!(
        "Pinned {} package(s) in {}.",
        lock.imports.len(),
        project.lock_path().display()
    ));

    let installer = Installer::new(project.vendor_path(), &backends, flags, guard);
    let report = installer.install(&lock, manifest)?;
    install::summarize(&report)
}

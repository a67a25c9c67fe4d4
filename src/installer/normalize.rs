//! Vendor tree normalization
//!
//! Two independent passes, both optional: stripping VCS metadata
//! directories anywhere under the vendor tree (for every backend, not
//! only the one that produced a checkout), and stripping nested vendor
//! trees plus legacy dependency-workspace directories found inside
//! installed packages. Running both is safe in either order.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, VendraError};
use crate::lockfile::Lockfile;
use crate::vcs::VcsKind;

use super::package_dir;

/// Directory names of nested dependency trees inside installed packages
const NESTED_VENDOR_DIRS: [&str; 2] = ["vendor", "_workspace"];

/// Remove VCS metadata directories recursively under the vendor tree
pub fn strip_vcs(vendor_root: &Path) -> Result<()> {
    if !vendor_root.is_dir() {
        return Ok(());
    }
    let metadata_dirs = VcsKind::all().map(VcsKind::metadata_dir);
    remove_named_dirs(vendor_root, &metadata_dirs)
}

/// Remove nested vendor and legacy workspace directories inside each
/// installed package
pub fn strip_nested_vendor(vendor_root: &Path, lock: &Lockfile) -> Result<()> {
    for import in &lock.imports {
        let pkg = package_dir(vendor_root, &import.name);
        if !pkg.is_dir() {
            continue;
        }
        remove_named_dirs(&pkg, &NESTED_VENDOR_DIRS)?;
    }
    Ok(())
}

/// Remove every directory under `root` whose name is in `names`,
/// without descending into removed subtrees
fn remove_named_dirs(root: &Path, names: &[&str]) -> Result<()> {
    let targets = collect_named_dirs(root, names)?;
    for target in targets {
        fs::remove_dir_all(&target).map_err(|e| VendraError::NormalizationFailed {
            message: format!("{}: {}", target.display(), e),
        })?;
    }
    Ok(())
}

fn collect_named_dirs(root: &Path, names: &[&str]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| VendraError::NormalizationFailed {
            message: e.to_string(),
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if names.contains(&name.as_ref()) {
            found.push(entry.path().to_path_buf());
            walker.skip_current_dir();
        }
    }
    Ok(found)
}

//! Removal of vendor directories no lockfile import claims
//!
//! Cleanup is strictly additive safety: a directory is removed only when
//! it is neither an installed package nor an ancestor of one. Paths that
//! belong to the resolved set are never touched, not even partially.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::lockfile::Lockfile;

/// Delete vendor directories whose import path is absent from `lock`.
///
/// Returns the removed import paths. Stray files between package roots are
/// left alone; intermediate directories emptied by a removal are pruned.
pub fn delete_unused(vendor_root: &Path, lock: &Lockfile) -> Result<Vec<String>> {
    if !vendor_root.is_dir() {
        return Ok(Vec::new());
    }

    let keep: HashSet<&str> = lock.imports.iter().map(|i| i.name.as_str()).collect();
    let mut removed = Vec::new();
    visit(vendor_root, "", &keep, &mut removed)?;
    removed.sort();
    Ok(removed)
}

fn visit(
    dir: &Path,
    rel: &str,
    keep: &HashSet<&str>,
    removed: &mut Vec<String>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let child_rel = if rel.is_empty() {
            name
        } else {
            format!("{rel}/{name}")
        };

        if keep.contains(child_rel.as_str()) {
            // An installed package; its subtree is owned by the lockfile
            continue;
        }

        let prefix = format!("{child_rel}/");
        if keep.iter().any(|k| k.starts_with(&prefix)) {
            // Ancestor of at least one installed package
            visit(&path, &child_rel, keep, removed)?;
            if fs::read_dir(&path)?.next().is_none() {
                fs::remove_dir(&path)?;
            }
        } else {
            fs::remove_dir_all(&path)?;
            removed.push(child_rel);
        }
    }
    Ok(())
}

//! Shared helpers for integration tests
//!
//! Builds local git repositories to act as dependency remotes and vendra
//! projects referencing them, so tests exercise the real binary without
//! network access.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::Repository;

/// Initialize a git repository at `dir`, returning it with its URL string
pub fn init_remote(dir: &Path) -> (Repository, String) {
    std::fs::create_dir_all(dir).expect("Failed to create remote dir");
    let repo = Repository::init(dir).expect("Failed to init git repository");
    let url = dir.to_string_lossy().to_string();
    (repo, url)
}

/// Write `content` to `name` in the repository work dir and commit it
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> git2::Oid {
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

/// Create a lightweight tag pointing at HEAD
pub fn tag_head(repo: &Repository, name: &str) {
    let commit = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .expect("Failed to resolve HEAD");
    repo.tag_lightweight(name, commit.as_object(), false)
        .expect("Failed to create tag");
}

/// Create a project directory with a vendra.yaml declaring one dependency
pub fn project_with_dependency(
    root: &Path,
    package: &str,
    repo_url: &str,
    version: Option<&str>,
) -> PathBuf {
    let project = root.join("project");
    std::fs::create_dir_all(&project).expect("Failed to create project dir");

    let mut manifest = format!(
        "package: example.com/me/app\nimports:\n- package: {package}\n  repo: {repo_url}\n"
    );
    if let Some(version) = version {
        manifest.push_str(&format!("  version: {version}\n"));
    }
    std::fs::write(project.join("vendra.yaml"), manifest).expect("Failed to write manifest");
    project
}

/// The vendra binary pointed at an isolated cache directory
pub fn vendra_cmd(project: &Path, cache: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("vendra").expect("binary exists");
    cmd.current_dir(project).env("VENDRA_CACHE_DIR", cache);
    cmd
}

//! End-to-end install and update tests against local git repositories

mod common;

use common::{commit_file, init_remote, project_with_dependency, tag_head, vendra_cmd};
use predicates::prelude::*;

const DEP_PACKAGE: &str = "example.com/libs/dep";

#[test]
fn update_resolves_pins_and_installs() {
    let temp = tempfile::TempDir::new().unwrap();
    let (remote, url) = init_remote(&temp.path().join("dep-repo"));
    let oid = commit_file(&remote, "lib.txt", "library code", "Initial commit");
    tag_head(&remote, "v1.0.0");

    let project = project_with_dependency(temp.path(), DEP_PACKAGE, &url, Some("1.0.0"));
    let cache = temp.path().join("cache");

    vendra_cmd(&project, &cache)
        .arg("update")
        .assert()
        .success();

    let lock = std::fs::read_to_string(project.join("vendra.lock")).unwrap();
    assert!(lock.contains(DEP_PACKAGE));
    assert!(lock.contains(&oid.to_string()));

    let vendored = project.join("vendor/example.com/libs/dep/lib.txt");
    assert!(vendored.exists());
    assert_eq!(std::fs::read_to_string(vendored).unwrap(), "library code");
}

#[test]
fn install_after_update_is_idempotent() {
    let temp = tempfile::TempDir::new().unwrap();
    let (remote, url) = init_remote(&temp.path().join("dep-repo"));
    commit_file(&remote, "lib.txt", "library code", "Initial commit");

    let project = project_with_dependency(temp.path(), DEP_PACKAGE, &url, None);
    let cache = temp.path().join("cache");

    vendra_cmd(&project, &cache)
        .arg("update")
        .assert()
        .success();

    vendra_cmd(&project, &cache)
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));
}

#[test]
fn install_without_lock_falls_back_to_update() {
    let temp = tempfile::TempDir::new().unwrap();
    let (remote, url) = init_remote(&temp.path().join("dep-repo"));
    commit_file(&remote, "lib.txt", "library code", "Initial commit");

    let project = project_with_dependency(temp.path(), DEP_PACKAGE, &url, None);
    let cache = temp.path().join("cache");

    vendra_cmd(&project, &cache)
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("Performing update"));

    assert!(project.join("vendra.lock").exists());
    assert!(project.join("vendor/example.com/libs/dep/lib.txt").exists());
}

#[test]
fn stale_lock_warns_but_still_installs() {
    let temp = tempfile::TempDir::new().unwrap();
    let (remote, url) = init_remote(&temp.path().join("dep-repo"));
    commit_file(&remote, "lib.txt", "library code", "Initial commit");
    tag_head(&remote, "v1.0.0");

    let project = project_with_dependency(temp.path(), DEP_PACKAGE, &url, Some("1.0.0"));
    let cache = temp.path().join("cache");

    vendra_cmd(&project, &cache)
        .arg("update")
        .assert()
        .success();

    // Loosen the constraint: the manifest hash changes, the lock does not
    let manifest = format!(
        "package: example.com/me/app\nimports:\n- package: {DEP_PACKAGE}\n  repo: {url}\n  version: ^1.0\n"
    );
    std::fs::write(project.join("vendra.yaml"), manifest).unwrap();

    vendra_cmd(&project, &cache)
        .arg("install")
        .assert()
        .success()
        .stderr(predicate::str::contains("out of date"));
}

#[test]
fn delete_flag_removes_unused_packages() {
    let temp = tempfile::TempDir::new().unwrap();
    let (remote, url) = init_remote(&temp.path().join("dep-repo"));
    commit_file(&remote, "lib.txt", "library code", "Initial commit");

    let project = project_with_dependency(temp.path(), DEP_PACKAGE, &url, None);
    let cache = temp.path().join("cache");

    let stale = project.join("vendor/example.com/stale");
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("old.txt"), "old").unwrap();

    vendra_cmd(&project, &cache)
        .args(["update", "--delete"])
        .assert()
        .success();

    assert!(!stale.exists());
    assert!(project.join("vendor/example.com/libs/dep").exists());
}

#[test]
fn strip_vcs_flag_removes_metadata() {
    let temp = tempfile::TempDir::new().unwrap();
    let (remote, url) = init_remote(&temp.path().join("dep-repo"));
    commit_file(&remote, "lib.txt", "library code", "Initial commit");

    let project = project_with_dependency(temp.path(), DEP_PACKAGE, &url, None);
    let cache = temp.path().join("cache");

    vendra_cmd(&project, &cache)
        .args(["update", "--strip-vcs"])
        .assert()
        .success();

    let pkg = project.join("vendor/example.com/libs/dep");
    assert!(pkg.join("lib.txt").exists());
    assert!(!pkg.join(".git").exists());
}

#[test]
fn unknown_reference_fails_resolution() {
    let temp = tempfile::TempDir::new().unwrap();
    let (remote, url) = init_remote(&temp.path().join("dep-repo"));
    commit_file(&remote, "lib.txt", "library code", "Initial commit");

    let project = project_with_dependency(temp.path(), DEP_PACKAGE, &url, Some("no-such-branch"));
    let cache = temp.path().join("cache");

    vendra_cmd(&project, &cache)
        .arg("update")
        .assert()
        .failure()
        .stderr(predicate::str::contains(DEP_PACKAGE));

    // Fatal resolution failure aborts before any disk mutation
    assert!(!project.join("vendra.lock").exists());
    assert!(!project.join("vendor").exists());
}

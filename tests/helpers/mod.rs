#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git in `dir`, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");

    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure(repo_path: &Path) {
    git(repo_path, &["config", "user.name", "Test User"]);
    git(repo_path, &["config", "user.email", "test@example.com"]);
    git(repo_path, &["config", "commit.gpgsign", "false"]);
    git(repo_path, &["config", "pull.rebase", "false"]);
}

/// Helper to create a test git repository on branch `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let repo_path = temp_dir.path().join("repo");
    fs::create_dir(&repo_path).expect("Failed to create repo dir");

    git(&repo_path, &["init"]);
    git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure(&repo_path);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

/// Bare repository next to `repo_path`, wired up as `origin` with `main` pushed
pub fn add_origin(repo_path: &Path) -> PathBuf {
    let remote_path = repo_path.with_file_name("origin.git");
    fs::create_dir(&remote_path).expect("Failed to create remote dir");
    git(&remote_path, &["init", "--bare"]);
    git(&remote_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    let url = remote_path.to_string_lossy().into_owned();
    git(repo_path, &["remote", "add", "origin", &url]);
    git(repo_path, &["push", "-u", "origin", "main"]);

    remote_path
}

/// Second working tree cloned from `remote_path`
pub fn clone_into(remote_path: &Path, name: &str) -> PathBuf {
    let parent = remote_path.parent().expect("remote has a parent");
    let url = remote_path.to_string_lossy().into_owned();
    git(parent, &["clone", &url, name]);

    let clone_path = parent.join(name);
    configure(&clone_path);
    clone_path
}

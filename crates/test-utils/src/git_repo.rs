use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run `git` in `repo` with a throw-away identity, panicking on failure.
pub fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args([
            "-c",
            "user.name=gitgate",
            "-c",
            "user.email=gitgate@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Write `contents` to `repo/file`, creating parent directories.
pub fn write(repo: &Path, file: &str, contents: &str) {
    let path = repo.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn read(repo: &Path, file: &str) -> String {
    fs::read_to_string(repo.join(file)).unwrap()
}

/// Indexed content of `file`.
pub fn staged(repo: &Path, file: &str) -> String {
    git(repo, &["show", &format!(":{file}")])
}

/// A fresh repository with `files` committed.
pub fn repo_with(files: &[(&str, &str)]) -> TempDir {
    let repo = tempfile::tempdir().unwrap();
    let root = repo.path();
    git(root, &["init", "-q"]);
    // Review diffs are printed; never wait on a pager.
    git(root, &["config", "core.pager", "cat"]);
    for (file, contents) in files {
        write(root, file, contents);
        git(root, &["add", file]);
    }
    git(root, &["commit", "-q", "--allow-empty", "-m", "initial"]);
    repo
}

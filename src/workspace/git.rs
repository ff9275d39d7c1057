// src/workspace/git.rs

//! Thin async wrapper around `git` plumbing.
//!
//! Every query goes through a subprocess and returns its textual output;
//! nothing here interprets repository internals.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use anyhow::{Context, Result, anyhow};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::RevisionRange;
use super::paths::paths_from_name_status;

/// Files that exist after the change: added, copied, modified, renamed.
const SURVIVING_FILTER: &str = "--diff-filter=ACMR";
/// Every change that touches a directory, deletions included.
const ALL_CHANGES_FILTER: &str = "--diff-filter=ACDMR";

#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Files changed in the index (or in `range`) that still exist.
    pub async fn changed_files(
        &self,
        range: Option<&RevisionRange>,
        pathspec: &[String],
    ) -> Result<Vec<String>> {
        let args = diff_args(range, &["--name-only", SURVIVING_FILTER], pathspec);
        let out = self.run_capture(&args).await?;
        Ok(out.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
    }

    /// Files whose working-tree content differs from the index.
    pub async fn locally_changed_files(&self, pathspec: &[String]) -> Result<Vec<String>> {
        let mut args = vec!["diff", "--name-only", SURVIVING_FILTER, "--"];
        args.extend(pathspec.iter().map(String::as_str));
        let out = self.run_capture(&args).await?;
        Ok(out.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
    }

    /// Every path touched by the change, including deleted and renamed-away
    /// paths.
    pub async fn changed_paths(
        &self,
        range: Option<&RevisionRange>,
        pathspec: &[String],
    ) -> Result<Vec<String>> {
        let args = diff_args(range, &["--name-status", ALL_CHANGES_FILTER], pathspec);
        let out = self.run_capture(&args).await?;
        Ok(paths_from_name_status(&out))
    }

    /// Check out the whole index below `prefix`.
    #[instrument(skip_all, fields(prefix = %prefix.display()))]
    pub async fn checkout_index_all(&self, prefix: &Path) -> Result<()> {
        let prefix = prefix_arg(prefix);
        self.run_capture(&["checkout-index", "-a", "-f", "--prefix", &prefix])
            .await?;
        Ok(())
    }

    /// Check out the indexed content of `paths` below `prefix`, replacing
    /// whatever is there.
    #[instrument(skip_all, fields(prefix = %prefix.display(), count = paths.len()))]
    pub async fn checkout_index_paths(&self, prefix: &Path, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let prefix = prefix_arg(prefix);
        let mut input = paths.join("\n");
        input.push('\n');
        self.run_with_stdin(
            &["checkout-index", "--stdin", "-f", "--prefix", &prefix],
            input.as_bytes(),
        )
        .await
    }

    /// Replace files with unstaged edits below `prefix` by their indexed
    /// content.
    pub async fn checkout_unstaged(&self, prefix: &Path) -> Result<()> {
        let out = self.run_capture(&["diff", "--name-only"]).await?;
        let paths: Vec<String> = out.lines().map(str::to_string).filter(|l| !l.is_empty()).collect();
        debug!(count = paths.len(), "overlaying files with unstaged edits");
        self.checkout_index_paths(prefix, &paths).await
    }

    /// Materialise the tree of `rev` below `prefix` through a throw-away
    /// index file, leaving the real index untouched.
    #[instrument(skip_all, fields(rev, prefix = %prefix.display()))]
    pub async fn checkout_revision(&self, rev: &str, prefix: &Path, index_file: &Path) -> Result<()> {
        let env = [("GIT_INDEX_FILE", index_file.as_os_str())];
        self.run_env(&["read-tree", rev], &env).await?;
        let prefix = prefix_arg(prefix);
        self.run_env(&["checkout-index", "-a", "-f", "--prefix", &prefix], &env)
            .await?;
        Ok(())
    }

    /// Show the working-tree diff of `files` on the terminal.
    pub async fn diff_interactive(&self, files: &[String]) -> Result<()> {
        let mut args = vec!["diff", "--"];
        args.extend(files.iter().map(String::as_str));
        self.run_interactive(&args).await
    }

    /// Stage `files`.
    pub async fn add(&self, files: &[String]) -> Result<()> {
        let mut args = vec!["add", "--"];
        args.extend(files.iter().map(String::as_str));
        self.run_interactive(&args).await
    }

    async fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_env(args, &[]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_env(&self, args: &[&str], env: &[(&str, &OsStr)]) -> Result<Output> {
        debug!(?args, "running git");
        let mut cmd = self.command(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        let output = cmd
            .output()
            .await
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        check_status(args, &output)?;
        Ok(output)
    }

    async fn run_with_stdin(&self, args: &[&str], input: &[u8]) -> Result<()> {
        debug!(?args, bytes = input.len(), "running git with stdin");
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input)
                .await
                .with_context(|| format!("writing stdin of git {}", args.join(" ")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("waiting for git {}", args.join(" ")))?;
        check_status(args, &output)
    }

    async fn run_interactive(&self, args: &[&str]) -> Result<()> {
        debug!(?args, "running interactive git");
        let status = self
            .command(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !status.success() {
            return Err(anyhow!("git {} failed: {status}", args.join(" ")));
        }
        Ok(())
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(&self.workdir)
            .args(["-c", "core.quotepath=off"])
            .args(args)
            .kill_on_drop(true);
        cmd
    }
}

fn check_status(args: &[&str], output: &Output) -> Result<()> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
    }
    Ok(())
}

/// `git diff` arguments comparing the index with HEAD, or the two ends of
/// `range`.
fn diff_args<'a>(
    range: Option<&'a RevisionRange>,
    flags: &[&'a str],
    pathspec: &'a [String],
) -> Vec<&'a str> {
    let mut args = vec!["diff"];
    match range {
        Some(range) => {
            args.push(range.from.as_str());
            args.push(range.to.as_str());
        }
        None => args.push("--cached"),
    }
    args.extend_from_slice(flags);
    args.push("--");
    args.extend(pathspec.iter().map(String::as_str));
    args
}

/// `checkout-index --prefix` treats its argument as a string prefix, so a
/// directory needs its trailing slash.
fn prefix_arg(dir: &Path) -> String {
    let mut s = dir.to_string_lossy().into_owned();
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

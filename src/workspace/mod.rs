// src/workspace/mod.rs

//! Isolated snapshot of the repository at its index state.
//!
//! - [`builder`] computes the change inventories and materialises the
//!   snapshot ([`Workspace::start`]).
//! - [`git`] wraps the `git` plumbing calls.
//! - [`units`] discovers build units (Go packages).
//! - [`paths`] holds the pure path reductions.
//!
//! A [`Workspace`] is read-only once built. It owns the temporary directory
//! holding the snapshot and removes it exactly once: on [`Workspace::close`]
//! or, failing that, on drop.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;
use tracing::debug;

use crate::errors::Result;

pub mod builder;
pub mod git;
pub mod paths;
pub mod units;

pub use builder::StartOptions;
pub use git::Git;
pub use paths::shortest_prefixes;

/// Module-path variable extended with the snapshot root for every command.
pub const MODULE_PATH_VAR: &str = "GOPATH";

/// What changed, relative to the repository root. Every list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Changed files that still exist.
    pub files: Vec<String>,
    /// Directories of changed files that still exist.
    pub dirs: Vec<String>,
    /// Build units inside `dirs`.
    pub units: Vec<String>,
    /// `dirs` reduced to entries not contained in another entry.
    pub trees: Vec<String>,
    /// Files whose working-tree content differs from the index.
    pub locally_changed: Vec<String>,
}

impl ChangeSet {
    pub fn has_local_changes(&self, file: &str) -> bool {
        self.locally_changed.iter().any(|f| f == file)
    }
}

/// `FROM..TO` revision range. `TO` defaults to `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRange {
    pub from: String,
    pub to: String,
}

impl FromStr for RevisionRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (from, to) = match s.split_once("..") {
            Some((from, to)) => (from, to),
            None => (s, ""),
        };
        if from.is_empty() {
            return Err(format!("invalid revision range '{s}': missing start revision"));
        }
        if to.starts_with('.') {
            return Err(format!(
                "invalid revision range '{s}': expected FROM..TO (symmetric ranges are not supported)"
            ));
        }
        let to = if to.is_empty() { "HEAD" } else { to };
        Ok(RevisionRange {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

impl fmt::Display for RevisionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// [`MODULE_PATH_VAR`] value with `work_dir` in front of the inherited one.
pub fn module_path_for(work_dir: &Path) -> OsString {
    let mut entries = vec![work_dir.to_path_buf()];
    if let Some(existing) = std::env::var_os(MODULE_PATH_VAR) {
        entries.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(entries).unwrap_or_else(|_| work_dir.as_os_str().to_os_string())
}

pub struct Workspace {
    git_dir: PathBuf,
    work_dir: PathBuf,
    root_dir: PathBuf,
    changes: ChangeSet,
    scratch: Mutex<Option<TempDir>>,
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("git_dir", &self.git_dir)
            .field("work_dir", &self.work_dir)
            .field("root_dir", &self.root_dir)
            .field("changes", &self.changes)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Build a workspace over an existing directory it does not own.
    ///
    /// Nothing is deleted on close. Used for tests and for callers that
    /// manage the directory themselves.
    pub fn detached(git_dir: impl Into<PathBuf>, root_dir: impl Into<PathBuf>, changes: ChangeSet) -> Self {
        let root_dir = root_dir.into();
        Self {
            git_dir: git_dir.into(),
            work_dir: root_dir.clone(),
            root_dir,
            changes,
            scratch: Mutex::new(None),
        }
    }

    pub(crate) fn owned(
        git_dir: PathBuf,
        scratch: TempDir,
        work_dir: PathBuf,
        root_dir: PathBuf,
        changes: ChangeSet,
    ) -> Self {
        Self {
            git_dir,
            work_dir,
            root_dir,
            changes,
            scratch: Mutex::new(Some(scratch)),
        }
    }

    /// The original repository.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Base of the temporary snapshot.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Root build unit inside the snapshot. Commands run here.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Value for [`MODULE_PATH_VAR`]: the snapshot first, then whatever the
    /// environment already had.
    pub fn module_path(&self) -> OsString {
        module_path_for(&self.work_dir)
    }

    /// Delete the snapshot. Later calls, and the eventual drop, are no-ops.
    pub fn close(&self) -> Result<()> {
        let scratch = self.lock_scratch().take();
        if let Some(dir) = scratch {
            debug!(path = %dir.path().display(), "removing workspace snapshot");
            dir.close()?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.lock_scratch().is_none()
    }

    fn lock_scratch(&self) -> MutexGuard<'_, Option<TempDir>> {
        self.scratch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_with_both_ends() {
        let r: RevisionRange = "v1.0..feature".parse().expect("range");
        assert_eq!(r.from, "v1.0");
        assert_eq!(r.to, "feature");
    }

    #[test]
    fn open_range_ends_at_head() {
        let r: RevisionRange = "origin/main..".parse().expect("range");
        assert_eq!(r.to, "HEAD");
        let r: RevisionRange = "origin/main".parse().expect("range");
        assert_eq!(r.to, "HEAD");
    }

    #[test]
    fn malformed_ranges_are_rejected() {
        assert!("..HEAD".parse::<RevisionRange>().is_err());
        assert!("a...b".parse::<RevisionRange>().is_err());
    }

    #[test]
    fn close_removes_owned_snapshot_once() {
        let scratch = tempfile::tempdir().expect("tempdir");
        let path = scratch.path().to_path_buf();
        let ws = Workspace::owned(
            PathBuf::from("."),
            scratch,
            path.clone(),
            path.clone(),
            ChangeSet::default(),
        );

        assert!(!ws.is_closed());
        ws.close().expect("first close");
        assert!(!path.exists());
        assert!(ws.is_closed());
        ws.close().expect("second close is a no-op");
    }

    #[test]
    fn detached_workspace_leaves_directory_alone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::detached(dir.path(), dir.path(), ChangeSet::default());
        ws.close().expect("close");
        drop(ws);
        assert!(dir.path().exists());
    }

    #[test]
    fn module_path_starts_with_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::detached(dir.path(), dir.path(), ChangeSet::default());
        let joined = ws.module_path();
        let first = std::env::split_paths(&joined).next().expect("entry");
        assert_eq!(first, dir.path());
    }
}

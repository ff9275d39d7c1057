// src/workspace/builder.rs

//! Snapshot builder.
//!
//! Computes the change inventories concurrently, materialises the indexed
//! tree in a private temporary directory, and hands both back as a
//! [`Workspace`]. If anything fails the temporary directory is dropped, and
//! with it deleted, before the error is returned.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow};
use colored::Colorize;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::errors::{GateError, Result};

use super::git::Git;
use super::paths::{existing_dirs, shortest_prefixes, sorted_unique};
use super::units;
use super::{ChangeSet, RevisionRange, Workspace, module_path_for};

const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Inputs for [`Workspace::start`].
#[derive(Debug, Clone)]
pub struct StartOptions {
    pub git_root: PathBuf,
    /// Restrict every diff to these pathspecs.
    pub pathspec: Vec<String>,
    /// Compare a revision range instead of the staged index.
    pub range: Option<RevisionRange>,
    /// Mirror the live tree with symlinks and overlay only what differs,
    /// instead of checking out every indexed file.
    pub link_tree: bool,
}

impl StartOptions {
    pub fn new(git_root: impl Into<PathBuf>) -> Self {
        Self {
            git_root: git_root.into(),
            pathspec: Vec::new(),
            range: None,
            link_tree: false,
        }
    }
}

impl Workspace {
    /// Build the snapshot described by `opts`.
    #[instrument(skip_all, fields(git_root = %opts.git_root.display()))]
    pub async fn start(opts: StartOptions) -> Result<Workspace> {
        build(opts).await.map_err(setup_error)
    }
}

async fn build(opts: StartOptions) -> anyhow::Result<Workspace> {
    let git_root = opts
        .git_root
        .canonicalize()
        .with_context(|| format!("resolving repository root {}", opts.git_root.display()))?;

    let scratch = tempfile::Builder::new()
        .prefix("gitgate")
        .tempdir()
        .context("creating workspace directory")?;
    let work_dir = scratch
        .path()
        .canonicalize()
        .context("resolving workspace directory")?;

    let module_path = module_path_for(&work_dir);
    let ticker = ProgressTicker::start("Identifying changed files.");
    let git = Git::new(&git_root);
    let range = opts.range.as_ref();

    let (files, locally_changed, touched, root_unit) = tokio::try_join!(
        git.changed_files(range, &opts.pathspec),
        async {
            // Unstaged edits only matter when checking the index.
            match range {
                Some(_) => Ok(Vec::new()),
                None => git.locally_changed_files(&opts.pathspec).await,
            }
        },
        git.changed_paths(range, &opts.pathspec),
        resolve_root_unit(&git_root, &module_path),
    )?;

    let root_dir = work_dir.join("src").join(&root_unit);
    tokio::fs::create_dir_all(&root_dir)
        .await
        .with_context(|| format!("creating {}", root_dir.display()))?;

    materialize(&git, &opts, &files, &work_dir, &root_dir).await?;

    let dirs = existing_dirs(&root_dir, &touched);
    let all_units = match units::list_units(&root_dir, &module_path).await {
        Ok(all) => all,
        Err(err) => {
            warn!(error = %err, "could not list build units; treating none as changed");
            Vec::new()
        }
    };
    let changed_units = units::changed_units(&root_unit, &all_units, &dirs);
    let trees = shortest_prefixes(&dirs);

    ticker.finish();

    let changes = ChangeSet {
        files: sorted_unique(files),
        locally_changed: sorted_unique(locally_changed),
        units: changed_units,
        trees,
        dirs,
    };
    info!(
        files = changes.files.len(),
        dirs = changes.dirs.len(),
        units = changes.units.len(),
        locally_changed = changes.locally_changed.len(),
        root = %root_dir.display(),
        "workspace ready"
    );

    Ok(Workspace::owned(git_root, scratch, work_dir, root_dir, changes))
}

fn setup_error(err: anyhow::Error) -> GateError {
    GateError::Setup(format!("{err:#}"))
}

/// Root unit import path, or the repository directory name when no unit
/// tool is available.
async fn resolve_root_unit(git_root: &Path, module_path: &OsStr) -> anyhow::Result<String> {
    match units::root_unit(git_root, module_path).await {
        Ok(unit) => Ok(unit),
        Err(err) => {
            let fallback = git_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("cannot derive a root unit for {}", git_root.display()))?;
            warn!(error = %err, %fallback, "could not resolve root unit; using directory name");
            Ok(fallback)
        }
    }
}

async fn materialize(
    git: &Git,
    opts: &StartOptions,
    files: &[String],
    work_dir: &Path,
    root_dir: &Path,
) -> anyhow::Result<()> {
    match (&opts.range, opts.link_tree) {
        (Some(range), _) => {
            debug!(%range, "materialising revision");
            let index_file = work_dir.join("gitgate.index");
            git.checkout_revision(&range.to, root_dir, &index_file).await
        }
        (None, true) => {
            debug!("materialising link tree");
            let source = git.workdir().to_path_buf();
            let target = root_dir.to_path_buf();
            tokio::task::spawn_blocking(move || link_tree(&source, &target))
                .await
                .context("link tree task panicked")??;
            git.checkout_unstaged(root_dir).await?;
            git.checkout_index_paths(root_dir, files).await
        }
        (None, false) => {
            debug!("materialising full index");
            git.checkout_index_all(root_dir).await
        }
    }
}

/// Mirror `source` into `target`: real directories, symlinked files.
/// `.git` is skipped.
#[cfg(unix)]
pub fn link_tree(source: &Path, target: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(target).with_context(|| format!("creating {}", target.display()))?;
    for entry in std::fs::read_dir(source).with_context(|| format!("reading {}", source.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }
        let from = entry.path();
        let to = target.join(&name);
        if entry.file_type()?.is_dir() {
            link_tree(&from, &to)?;
        } else {
            std::os::unix::fs::symlink(&from, &to)
                .with_context(|| format!("linking {} -> {}", to.display(), from.display()))?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn link_tree(_source: &Path, _target: &Path) -> anyhow::Result<()> {
    Err(anyhow!("link-tree mode is only supported on unix platforms"))
}

/// Prints a dot every tick until finished or dropped. Either way the line
/// is closed exactly once.
struct ProgressTicker {
    handle: JoinHandle<()>,
    line_open: bool,
}

impl ProgressTicker {
    fn start(msg: &str) -> Self {
        print!("{}", msg.yellow());
        let _ = std::io::stdout().flush();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                print!("{}", ".".yellow());
                let _ = std::io::stdout().flush();
            }
        });
        Self {
            handle,
            line_open: true,
        }
    }

    fn finish(mut self) {
        self.close_line();
    }

    /// Stop ticking and end the line. Returns whether the line was still open.
    fn close_line(&mut self) -> bool {
        self.handle.abort();
        if !self.line_open {
            return false;
        }
        self.line_open = false;
        println!();
        true
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.close_line();
    }
}

// src/sched/restage.rs

//! Writing reformatted files back to the repository and staging them.

use std::io::Write;

use anyhow::Context;
use colored::Colorize;
use tracing::debug;

use crate::exec::ExecFuture;
use crate::workspace::{Git, Workspace};

/// The side effects of the reformat workflow that touch the real
/// repository or the operator.
pub trait Restager: Send + Sync {
    /// Show `prompt` and wait for the operator.
    fn confirm<'a>(&'a self, prompt: &'a str) -> ExecFuture<'a, ()>;

    /// Copy `files` from the snapshot into the repository working tree.
    fn sync<'a>(&'a self, ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()>;

    /// Show the operator what changed in `files`.
    fn review<'a>(&'a self, ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()>;

    /// Stage `files` in the repository index.
    fn stage<'a>(&'a self, ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()>;

    /// Put the indexed content of `files` back into the snapshot, undoing
    /// whatever the format command did to them.
    fn restore<'a>(&'a self, ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()>;
}

/// Production restager: file copies plus `git diff` / `git add`.
#[derive(Debug, Clone, Default)]
pub struct GitRestager {
    /// Skip waiting for the operator.
    assume_yes: bool,
}

impl GitRestager {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Restager for GitRestager {
    fn confirm<'a>(&'a self, prompt: &'a str) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            println!("{}", prompt.white());
            if self.assume_yes {
                return Ok(());
            }
            let _ = std::io::stdout().flush();
            // Ctrl-C is the way out; a closed stdin just continues.
            tokio::task::spawn_blocking(|| {
                let mut line = String::new();
                std::io::stdin().read_line(&mut line).map(|_| ())
            })
            .await
            .context("waiting for operator input")??;
            Ok(())
        })
    }

    fn sync<'a>(&'a self, ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            for file in files {
                let from = ws.root_dir().join(file);
                let to = ws.git_dir().join(file);
                if let Some(parent) = to.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                debug!(from = %from.display(), to = %to.display(), "syncing file");
                tokio::fs::copy(&from, &to)
                    .await
                    .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
            }
            Ok(())
        })
    }

    fn review<'a>(&'a self, ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            Git::new(ws.git_dir()).diff_interactive(files).await?;
            Ok(())
        })
    }

    fn stage<'a>(&'a self, ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            Git::new(ws.git_dir()).add(files).await?;
            Ok(())
        })
    }

    fn restore<'a>(&'a self, ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            debug!(count = files.len(), "restoring indexed content in snapshot");
            Git::new(ws.git_dir())
                .checkout_index_paths(ws.root_dir(), files)
                .await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::ChangeSet;

    #[tokio::test]
    async fn sync_copies_into_repository_tree() {
        let repo = tempfile::tempdir().expect("repo");
        let snapshot = tempfile::tempdir().expect("snapshot");
        std::fs::create_dir_all(snapshot.path().join("pkg")).expect("mkdir");
        std::fs::write(snapshot.path().join("pkg/x.go"), "formatted\n").expect("write");

        let ws = Workspace::detached(repo.path(), snapshot.path(), ChangeSet::default());
        let files = vec!["pkg/x.go".to_string()];
        GitRestager::new(true).sync(&ws, &files).await.expect("sync");

        let copied = std::fs::read_to_string(repo.path().join("pkg/x.go")).expect("read");
        assert_eq!(copied, "formatted\n");
    }
}

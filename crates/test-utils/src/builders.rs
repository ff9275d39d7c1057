#![allow(dead_code)]

use std::sync::Arc;

use gitgate::check::{Check, Command, ReformatCheck};
use gitgate::errors::Result;
use gitgate::exec::Executor;
use gitgate::sched::{CheckStream, Restager, RunContext, RunOptions};
use gitgate::workspace::{ChangeSet, Workspace};
use tempfile::TempDir;

/// A command whose name is its full text, so events can be matched by name.
pub fn command(text: &str) -> Command {
    Command {
        name: text.to_string(),
        ..Command::new(text)
    }
}

pub fn single(text: &str) -> Check {
    Check::Single(command(text))
}

pub fn seq(children: Vec<Check>) -> Check {
    Check::sequential(children)
}

pub fn par(children: Vec<Check>) -> Check {
    Check::parallel(children)
}

pub fn reformat(check: &str, format: &str) -> Check {
    Check::Reformat(ReformatCheck {
        check: command(check),
        format: command(format),
    })
}

/// Builder for `ChangeSet`.
#[derive(Debug, Default)]
pub struct ChangeSetBuilder {
    changes: ChangeSet,
}

impl ChangeSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str) -> Self {
        self.changes.files.push(path.to_string());
        self
    }

    pub fn locally_changed(mut self, path: &str) -> Self {
        self.changes.locally_changed.push(path.to_string());
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.changes.dirs.push(path.to_string());
        self
    }

    pub fn unit(mut self, name: &str) -> Self {
        self.changes.units.push(name.to_string());
        self
    }

    pub fn tree(mut self, path: &str) -> Self {
        self.changes.trees.push(path.to_string());
        self
    }

    pub fn build(self) -> ChangeSet {
        self.changes
    }
}

/// A detached workspace over fresh temporary directories.
///
/// The returned guards keep the repository and snapshot directories alive.
pub struct TestWorkspace {
    pub repo: TempDir,
    pub snapshot: TempDir,
    pub workspace: Arc<Workspace>,
}

impl TestWorkspace {
    pub fn new(changes: ChangeSet) -> Self {
        let repo = tempfile::tempdir().expect("repo tempdir");
        let snapshot = tempfile::tempdir().expect("snapshot tempdir");
        let workspace = Arc::new(Workspace::detached(repo.path(), snapshot.path(), changes));
        Self {
            repo,
            snapshot,
            workspace,
        }
    }

    pub fn context(
        &self,
        executor: Arc<dyn Executor>,
        restager: Arc<dyn Restager>,
        options: RunOptions,
    ) -> Arc<RunContext> {
        Arc::new(RunContext {
            workspace: Arc::clone(&self.workspace),
            executor,
            restager,
            options,
        })
    }
}

/// Drain a result stream until it closes.
pub async fn collect(mut stream: CheckStream) -> Vec<Result<()>> {
    let mut results = Vec::new();
    while let Some(result) = stream.recv().await {
        results.push(result);
    }
    results
}

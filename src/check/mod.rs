// src/check/mod.rs

//! Compiled check tree.
//!
//! A [`Check`] is produced once by the config compiler and is read-only
//! afterwards. Children of a group are held behind `Arc` so the scheduler can
//! hand sub-trees to independently spawned tasks without copying them.

use std::sync::Arc;

use serde::Deserialize;

/// Display name used for a blank command.
pub const EMPTY_COMMAND_NAME: &str = "<empty command>";

/// One invocable unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Command {
    /// Shell text, executed with `set -e` semantics.
    #[serde(default)]
    pub command: String,

    /// Display name. Unique within a run once compiled.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Any output at all counts as failure.
    #[serde(default)]
    pub expect_silence: bool,

    /// Config path this command was compiled from (diagnostics only).
    #[serde(skip)]
    pub path: String,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// The name a command gets when none is configured: its first word, or
    /// [`EMPTY_COMMAND_NAME`] when blank.
    pub fn base_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        self.command
            .split_whitespace()
            .next()
            .unwrap_or(EMPTY_COMMAND_NAME)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }
}

/// An ordered group of checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManyChecks {
    pub checks: Vec<Arc<Check>>,
    /// Launch every child before waiting on any of them.
    pub parallel: bool,
}

/// A detect/fix command pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReformatCheck {
    /// Prints the files that need reformatting, whitespace separated.
    pub check: Command,
    /// Rewrites files in place.
    pub format: Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Single(Command),
    Many(ManyChecks),
    Reformat(ReformatCheck),
}

impl Check {
    pub fn sequential(checks: Vec<Check>) -> Self {
        Check::Many(ManyChecks {
            checks: checks.into_iter().map(Arc::new).collect(),
            parallel: false,
        })
    }

    pub fn parallel(checks: Vec<Check>) -> Self {
        Check::Many(ManyChecks {
            checks: checks.into_iter().map(Arc::new).collect(),
            parallel: true,
        })
    }

    pub fn as_single(&self) -> Option<&Command> {
        match self {
            Check::Single(cmd) => Some(cmd),
            _ => None,
        }
    }

    /// Every command in the tree, depth first.
    pub fn commands(&self) -> Vec<&Command> {
        let mut out = Vec::new();
        self.collect_commands(&mut out);
        out
    }

    fn collect_commands<'a>(&'a self, out: &mut Vec<&'a Command>) {
        match self {
            Check::Single(cmd) => out.push(cmd),
            Check::Many(many) => {
                for child in &many.checks {
                    child.collect_commands(out);
                }
            }
            Check::Reformat(r) => {
                out.push(&r.check);
                out.push(&r.format);
            }
        }
    }
}

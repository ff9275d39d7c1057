// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::workspace::RevisionRange;

/// Command-line arguments for `gitgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gitgate",
    version,
    about = "Run pre-commit checks against a snapshot of the git index.",
    long_about = None
)]
pub struct CliArgs {
    /// Check config (YAML, rendered as a template first).
    ///
    /// If omitted, a built-in flow builds, vets, formats and compiles the
    /// tests of the changed Go packages.
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Print what would run without running anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print template data and enable debug logging.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GITGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Repository root.
    #[arg(short = 'C', long = "repo", value_name = "DIR", default_value = ".")]
    pub repo: PathBuf,

    /// Check a revision range (`FROM..TO`) instead of the staged index.
    ///
    /// Reformat steps are skipped in this mode.
    #[arg(long, value_name = "FROM..TO")]
    pub range: Option<RevisionRange>,

    /// Only consider changes matching this pathspec. Repeatable.
    #[arg(long = "path", value_name = "PATHSPEC")]
    pub paths: Vec<String>,

    /// Mirror the working tree with symlinks instead of checking out every
    /// indexed file.
    #[arg(long)]
    pub lndir: bool,

    /// Report files that need reformatting but never rewrite them.
    #[arg(long)]
    pub no_reformat: bool,

    /// Do not wait for confirmation before reformatting.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl CliArgs {
    /// `--debug` implies debug logging unless a level was given explicitly.
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        match (self.log_level, self.debug) {
            (Some(level), _) => Some(level),
            (None, true) => Some(LogLevel::Debug),
            (None, false) => None,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

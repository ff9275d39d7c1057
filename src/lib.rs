// src/lib.rs

pub mod check;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod sched;
pub mod workspace;

use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{TemplateData, load_and_compile};
use crate::errors::Result;
use crate::exec::CommandExecutor;
use crate::sched::{GitRestager, RunContext, RunOptions, run_check};
use crate::workspace::{StartOptions, Workspace};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the workspace snapshot
/// - template rendering and compilation of the check config
/// - the tree runner and executor
///
/// The snapshot is removed before this returns, whatever the outcome. The
/// first error reported by any check is returned immediately; checks that
/// are still running are not waited for.
pub async fn run(args: CliArgs) -> Result<()> {
    let opts = StartOptions {
        git_root: args.repo.clone(),
        pathspec: args.paths.clone(),
        range: args.range.clone(),
        link_tree: args.lndir,
    };
    let ws = Arc::new(Workspace::start(opts).await?);

    let result = run_in_workspace(&args, Arc::clone(&ws)).await;
    let closed = ws.close();
    result?;
    closed
}

async fn run_in_workspace(args: &CliArgs, ws: Arc<Workspace>) -> Result<()> {
    let data = TemplateData::from_workspace(&ws);
    if args.debug {
        println!("Template data: {data:#?}");
    }

    let check = load_and_compile(args.config.as_deref(), &data)?;
    debug!(commands = check.commands().len(), "compiled check config");

    // Templated commands and unit discovery are relative to the root unit.
    std::env::set_current_dir(ws.root_dir())?;

    let ctx = Arc::new(RunContext {
        workspace: ws,
        executor: Arc::new(CommandExecutor::new(args.dry_run)),
        restager: Arc::new(GitRestager::new(args.yes)),
        options: RunOptions {
            skip_reformat: args.range.is_some(),
            auto_fix: !args.no_reformat,
        },
    });

    let mut results = run_check(ctx, Arc::new(check));
    while let Some(result) = results.recv().await {
        result?;
    }

    info!("all checks passed");
    Ok(())
}

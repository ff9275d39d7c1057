// src/sched/reformat.rs

//! Check-then-format workflow for reformat nodes.
//!
//! 1. Run the check command; its output lists files needing reformatting.
//! 2. Leave files with unstaged edits alone and report them.
//! 3. With auto-fix enabled and something left to fix: confirm, format,
//!    put skipped files back to their indexed content, copy back, review,
//!    stage, copy back again, re-check.
//! 4. Anything still listed fails the run.

use colored::Colorize;
use tracing::{debug, info};

use crate::check::{Command, ReformatCheck};
use crate::errors::{GateError, Result};
use crate::workspace::ChangeSet;

use super::runner::RunContext;

pub const CONFIRM_PROMPT: &str = "Automatically reformatting files.  Press <Enter> to review changes. Hit Ctrl-C at any point to abort commit.";

/// Files named by a check command, split by whether they may be rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReformatPlan {
    /// Safe to rewrite and restage.
    pub eligible: Vec<String>,
    /// Carry unstaged edits; never touched.
    pub skipped: Vec<String>,
}

/// Split the whitespace-separated `output` of a check command.
pub fn partition(output: &str, changes: &ChangeSet) -> ReformatPlan {
    let mut plan = ReformatPlan::default();
    for file in output.split_whitespace() {
        if changes.has_local_changes(file) {
            plan.skipped.push(file.to_string());
        } else {
            plan.eligible.push(file.to_string());
        }
    }
    plan
}

/// Run the reformat workflow for `check`.
pub async fn reformat(ctx: &RunContext, check: &ReformatCheck) -> Result<()> {
    let ws = ctx.workspace.as_ref();
    let changed = ws.changes().files.len();
    if changed == 0 {
        debug!("no changed files; skipping reformat");
        return Ok(());
    }

    let check_cmd = with_default_description(
        &check.check,
        format!("Checking formatting ... ({changed} file(s) changed)"),
    );
    let mut needs_formatting = ctx.executor.execute_with_output(ws, &check_cmd).await?;

    if needs_formatting.trim().is_empty() {
        println!("{}", "No files need reformatting!".green());
        return Ok(());
    }

    let plan = partition(&needs_formatting, ws.changes());
    for file in &plan.skipped {
        println!(
            "{}",
            format!("Did not automatically reformat '{file}' because it has un-staged changes.").red()
        );
    }

    if !plan.eligible.is_empty() && ctx.options.auto_fix {
        println!(
            "{}",
            format!("The following files need formatting:\n{}", needs_formatting.trim_end()).white()
        );
        ctx.restager.confirm(CONFIRM_PROMPT).await?;

        let format_cmd = with_default_description(&check.format, "Reformatting".to_string());
        ctx.executor.execute(ws, &format_cmd).await?;
        if !plan.skipped.is_empty() {
            // The format command text may name every changed file; skipped
            // ones must still fail the re-check below.
            ctx.restager.restore(ws, &plan.skipped).await?;
        }

        info!(files = plan.eligible.len(), "restaging reformatted files");
        ctx.restager.sync(ws, &plan.eligible).await?;
        ctx.restager.review(ws, &plan.eligible).await?;
        ctx.restager.stage(ws, &plan.eligible).await?;
        // The review step may have edited files; copy them over once more.
        ctx.restager.sync(ws, &plan.eligible).await?;

        needs_formatting = ctx.executor.execute_with_output(ws, &check_cmd).await?;
    }

    if !needs_formatting.trim().is_empty() {
        return Err(GateError::ReformatResidual(needs_formatting.trim_end().to_string()));
    }
    Ok(())
}

fn with_default_description(cmd: &Command, description: String) -> Command {
    let mut cmd = cmd.clone();
    if cmd.description().is_none() {
        cmd.description = Some(description);
    }
    cmd
}

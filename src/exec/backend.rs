// src/exec/backend.rs

//! Executor abstraction and the production shell executor.
//!
//! The scheduler and the reformat workflow talk to an [`Executor`] instead of
//! spawning processes themselves, so tests can swap in a fake that records
//! what ran and scripts failures.

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tempfile::NamedTempFile;
use tokio::process::Command as ProcessCommand;
use tracing::{debug, info};

use crate::check::{Command, EMPTY_COMMAND_NAME};
use crate::errors::{GateError, Result};
use crate::workspace::Workspace;

use super::output::{CmdStatus, print_cmd_line};
use super::palette::Palette;

/// Boxed future returned by executor methods.
pub type ExecFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Header written in front of every command script.
const SCRIPT_HEADER: &str = "set -e\n";

/// Runs the script named by `$0` with stderr folded into stdout.
const COMBINED_OUTPUT_WRAPPER: &str = r#"exec bash "$0" 2>&1"#;

pub const SILENCE_VIOLATION: &str = "expected no output but output was present";

/// Trait abstracting how a single command is run.
///
/// A returned error is fatal to the whole run; callers propagate it and never
/// retry.
pub trait Executor: Send + Sync {
    /// Run `cmd` and return its combined stdout/stderr.
    fn execute_with_output<'a>(
        &'a self,
        ws: &'a Workspace,
        cmd: &'a Command,
    ) -> ExecFuture<'a, String>;

    /// Run `cmd`, discarding its output.
    fn execute<'a>(&'a self, ws: &'a Workspace, cmd: &'a Command) -> ExecFuture<'a, ()> {
        Box::pin(async move { self.execute_with_output(ws, cmd).await.map(|_| ()) })
    }
}

/// Executor that runs commands through `bash` as temporary scripts.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    dry_run: bool,
    palette: Arc<Palette>,
}

impl CommandExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self::with_palette(dry_run, Arc::new(Palette::default()))
    }

    pub fn with_palette(dry_run: bool, palette: Arc<Palette>) -> Self {
        Self { dry_run, palette }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    async fn run(&self, ws: &Workspace, cmd: &Command) -> Result<String> {
        let lease = self.palette.checkout();
        let color = lease.color();

        // Deleted when `script` is dropped, on every path out of here.
        let script = write_script(cmd)?;

        print_cmd_line(CmdStatus::Info, &cmd.name, color, &announcement(cmd));

        if self.dry_run {
            let contents = tokio::fs::read_to_string(script.path()).await?;
            print_cmd_line(
                CmdStatus::Info,
                &cmd.name,
                color,
                &format!("Would have run:\n=========\n{contents}\n========"),
            );
            return Ok(String::new());
        }

        info!(name = %cmd.name, path = %cmd.path, "starting command");
        let start = Instant::now();
        let result = run_script(ws, script.path()).await;
        let elapsed = start.elapsed().as_secs_f64();

        let (output, failure) = match result {
            Ok((status, output)) => {
                let failure = failure_reason(status, &output, cmd.expect_silence);
                (output, failure)
            }
            Err(err) => (String::new(), Some(format!("{err:#}"))),
        };

        match failure {
            Some(reason) => {
                print_cmd_line(
                    CmdStatus::Fail,
                    &cmd.name,
                    color,
                    &format!(
                        "Command:\n{}\nError: {reason}\nOutput:\n{output}\nFAIL ({elapsed:.3}s)",
                        cmd.command
                    ),
                );
                Err(GateError::command_failed(&cmd.name, reason))
            }
            None => {
                print_cmd_line(
                    CmdStatus::Pass,
                    &cmd.name,
                    color,
                    &format!("PASS ({elapsed:.3}s)"),
                );
                debug!(name = %cmd.name, bytes = output.len(), "command passed");
                Ok(output)
            }
        }
    }
}

impl Executor for CommandExecutor {
    fn execute_with_output<'a>(
        &'a self,
        ws: &'a Workspace,
        cmd: &'a Command,
    ) -> ExecFuture<'a, String> {
        Box::pin(self.run(ws, cmd))
    }
}

/// The line printed before a command runs.
pub fn announcement(cmd: &Command) -> String {
    let text = cmd.description().unwrap_or(&cmd.command);
    let trimmed = text.trim();

    let mut msg = String::from("Running:");
    msg.push(if trimmed.contains('\n') { '\n' } else { ' ' });
    if trimmed.is_empty() {
        msg.push_str(EMPTY_COMMAND_NAME);
    } else {
        msg.push_str(text);
    }
    msg
}

/// Decide whether a finished command failed, and why.
pub fn failure_reason(status: ExitStatus, output: &str, expect_silence: bool) -> Option<String> {
    if !status.success() {
        return Some(match status.code() {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        });
    }
    if expect_silence && !output.trim().is_empty() {
        return Some(SILENCE_VIOLATION.to_string());
    }
    None
}

fn write_script(cmd: &Command) -> Result<NamedTempFile> {
    let prefix: String = cmd
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".sh")
        .tempfile()
        .with_context(|| format!("creating script for command '{}'", cmd.name))?;

    file.write_all(SCRIPT_HEADER.as_bytes())?;
    file.write_all(cmd.command.as_bytes())?;
    file.flush()?;
    Ok(file)
}

async fn run_script(ws: &Workspace, script: &Path) -> anyhow::Result<(ExitStatus, String)> {
    let mut process = ProcessCommand::new("bash");
    process
        .arg("-c")
        .arg(COMBINED_OUTPUT_WRAPPER)
        .arg(script)
        .current_dir(ws.root_dir())
        .env(crate::workspace::MODULE_PATH_VAR, ws.module_path())
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = process
        .output()
        .await
        .with_context(|| format!("running script {}", script.display()))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok((output.status, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announcement_prefers_description() {
        let cmd = Command {
            description: Some("Compiling tests".into()),
            ..Command::new("go test ./...")
        };
        assert_eq!(announcement(&cmd), "Running: Compiling tests");
    }

    #[test]
    fn multi_line_commands_start_on_a_new_line() {
        let cmd = Command::new("echo a\necho b\n");
        assert_eq!(announcement(&cmd), "Running:\necho a\necho b\n");
    }

    #[test]
    fn blank_command_is_announced_as_empty() {
        assert_eq!(
            announcement(&Command::new("  ")),
            format!("Running: {EMPTY_COMMAND_NAME}")
        );
    }
}

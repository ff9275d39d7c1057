// src/workspace/units.rs

//! Build-unit discovery.
//!
//! Units are Go packages, discovered with `go list`. The root unit's import
//! path decides where the snapshot is materialised (`<work>/src/<unit>`).

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tokio::process::Command;
use tracing::{debug, instrument};

use super::MODULE_PATH_VAR;

/// Resolve the import path of the unit rooted at `dir`.
///
/// `module_path` is the [`MODULE_PATH_VAR`] value the lookup runs with.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub async fn root_unit(dir: &Path, module_path: &OsStr) -> Result<String> {
    let out = go_list(dir, &["-e", "."], module_path).await?;
    let unit = out.trim().to_string();
    if unit.is_empty() {
        return Err(anyhow!("`go list -e .` returned no unit for {}", dir.display()));
    }
    debug!(%unit, "resolved root unit");
    Ok(unit)
}

/// Every unit below `dir`.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub async fn list_units(dir: &Path, module_path: &OsStr) -> Result<Vec<String>> {
    let out = go_list(dir, &["./..."], module_path).await?;
    Ok(out.split_whitespace().map(str::to_string).collect())
}

/// Units whose directory (relative to the root unit) is in `dirs`.
///
/// The root unit itself maps to `.`. The result is sorted.
pub fn changed_units<S: AsRef<str>>(root_unit: &str, units: &[String], dirs: &[S]) -> Vec<String> {
    let dirs: BTreeSet<&str> = dirs.iter().map(AsRef::as_ref).collect();
    let root_prefix = format!("{root_unit}/");

    units
        .iter()
        .filter(|unit| {
            let dir = if unit.as_str() == root_unit {
                "."
            } else {
                unit.strip_prefix(&root_prefix).unwrap_or(unit.as_str())
            };
            dirs.contains(dir)
        })
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn go_list_command(dir: &Path, args: &[&str], module_path: &OsStr) -> Command {
    let mut cmd = Command::new("go");
    cmd.arg("list")
        .args(args)
        .current_dir(dir)
        .env(MODULE_PATH_VAR, module_path);
    cmd
}

async fn go_list(dir: &Path, args: &[&str], module_path: &OsStr) -> Result<String> {
    debug!(?args, "running go list");
    let output = go_list_command(dir, args, module_path)
        .output()
        .await
        .with_context(|| format!("spawning `go list` in {}", dir.display()))?;

    if !output.status.success() {
        return Err(anyhow!(
            "`go list {}` failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

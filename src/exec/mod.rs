// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the [`Executor`] trait and the production
//!   [`CommandExecutor`] (temporary `set -e` scripts run through `bash`).
//! - [`palette`] hands out display colours to concurrently running commands.
//! - [`output`] prints `| name | line` rows in a command's colour.

pub mod backend;
pub mod output;
pub mod palette;

pub use backend::{CommandExecutor, ExecFuture, Executor, SILENCE_VIOLATION};
pub use output::{CmdStatus, print_cmd_line};
pub use palette::{CMD_COLORS, ColorLease, Palette};

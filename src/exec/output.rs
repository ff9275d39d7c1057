// src/exec/output.rs

//! Line-prefixed, coloured command output.

use std::io::Write;

use colored::{Color, Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdStatus {
    Pass,
    Fail,
    Info,
}

/// Split `msg` into `| name | line` rows.
pub fn format_cmd_lines(name: &str, msg: &str) -> Vec<String> {
    msg.split('\n')
        .map(|line| format!("| {name} | {line}"))
        .collect()
}

/// Print a message for one command in its leased colour.
///
/// All rows of one message are written under a single stdout lock so that
/// concurrently running commands never interleave inside a block.
pub fn print_cmd_line(status: CmdStatus, name: &str, color: Color, msg: &str) {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in format_cmd_lines(name, msg) {
        let styled = match status {
            CmdStatus::Fail => row.color(color).bold(),
            CmdStatus::Pass | CmdStatus::Info => row.color(color),
        };
        // Nothing sensible to do if stdout is gone.
        let _ = writeln!(out, "{styled}");
    }
    let _ = out.flush();
}

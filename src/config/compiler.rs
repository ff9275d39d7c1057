// src/config/compiler.rs

//! Compiles a decoded YAML document into a [`Check`] tree.
//!
//! Grammar, by node shape:
//!
//! - string: a command
//! - sequence: a sequential group, children at `<path>/<n>` (1-based)
//! - `{reformat: {check: .., format: ..}}`: a reformat pair; both slots must
//!   compile to single commands
//! - `{parallel: [..]}`: a parallel group (absent value = empty group)
//! - `{run: ..}`: string, sequence, nested node, or absent (empty command)
//! - any other mapping: command fields (`command`, `name`, `description`,
//!   `expect_silence`)
//!
//! Compilation is depth first and stops at the first violation. Paths in
//! error messages render the root as `/`.

use std::collections::{HashMap, HashSet};

use serde_yaml::{Mapping, Value};
use tracing::trace;

use crate::check::{Check, Command, ManyChecks, ReformatCheck};
use crate::errors::{GateError, Result};

const REFORMAT_KEY: &str = "reformat";
const PARALLEL_KEY: &str = "parallel";
const RUN_KEY: &str = "run";
const CHECK_KEY: &str = "check";
const FORMAT_KEY: &str = "format";

/// Compile a whole document with a fresh compiler.
pub fn compile(doc: &Value) -> Result<Check> {
    Compiler::new().compile(doc, "")
}

/// One compile run. Name numbering is scoped to the instance.
#[derive(Debug, Default)]
pub struct Compiler {
    seen_names: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&mut self, node: &Value, path: &str) -> Result<Check> {
        trace!(path = or_root(path), "compiling node");
        match node {
            Value::Mapping(map) => self.compile_mapping(map, path),
            Value::String(text) => Ok(self.single(Command::new(text.as_str()), path)),
            Value::Sequence(items) => self.compile_group(items, path, false),
            other => Err(GateError::compile(format!(
                "unexpected type: {} at {}",
                describe(other),
                or_root(path)
            ))),
        }
    }

    fn compile_mapping(&mut self, map: &Mapping, path: &str) -> Result<Check> {
        if let Some(reformat) = map.get(REFORMAT_KEY) {
            if map.len() > 1 {
                return Err(sole_key_error(REFORMAT_KEY, path));
            }
            return match reformat {
                Value::Mapping(pair) => self.compile_reformat(pair, path),
                _ => Err(GateError::compile(format!(
                    "value for key 'reformat' must be an object at {}",
                    or_root(path)
                ))),
            };
        }

        if let Some(parallel) = map.get(PARALLEL_KEY) {
            if map.len() > 1 {
                return Err(sole_key_error(PARALLEL_KEY, path));
            }
            let group_path = format!("{path}/{PARALLEL_KEY}");
            return match parallel {
                Value::Null => self.compile_group(&[], &group_path, true),
                Value::Sequence(items) => self.compile_group(items, &group_path, true),
                _ => Err(GateError::compile(format!(
                    "value for key 'parallel' must be an array at {}",
                    or_root(path)
                ))),
            };
        }

        if let Some(run) = map.get(RUN_KEY) {
            if map.len() > 1 {
                return Err(sole_key_error(RUN_KEY, path));
            }
            return match run {
                Value::Null => Ok(self.single(Command::default(), path)),
                Value::String(text) => Ok(self.single(Command::new(text.as_str()), path)),
                Value::Sequence(items) => self.compile_group(items, path, false),
                Value::Mapping(_) => self.compile(run, &format!("{path}/{RUN_KEY}")),
                other => Err(GateError::compile(format!(
                    "unexpected type for 'run' at {}: {}",
                    or_root(path),
                    describe(other)
                ))),
            };
        }

        let cmd: Command = serde_yaml::from_value(Value::Mapping(map.clone())).map_err(|err| {
            GateError::compile(format!("unable to parse command at {}: {err}", or_root(path)))
        })?;
        Ok(self.single(cmd, path))
    }

    fn compile_reformat(&mut self, pair: &Mapping, path: &str) -> Result<Check> {
        for key in pair.keys() {
            let known = matches!(key.as_str(), Some(CHECK_KEY) | Some(FORMAT_KEY));
            if !known {
                return Err(GateError::compile(format!(
                    "unexpected key {} in 'reformat' at {}",
                    describe(key),
                    or_root(path)
                )));
            }
        }

        let check = self.reformat_slot(pair, CHECK_KEY, path)?;
        let format = self.reformat_slot(pair, FORMAT_KEY, path)?;
        Ok(Check::Reformat(ReformatCheck { check, format }))
    }

    fn reformat_slot(&mut self, pair: &Mapping, key: &str, path: &str) -> Result<Command> {
        let node = pair.get(key).unwrap_or(&Value::Null);
        let compiled = self
            .compile(node, &format!("{path}/{key}"))
            .map_err(|err| {
                GateError::compile(format!(
                    "could not parse reformat '{key}' at {}: {err}",
                    or_root(path)
                ))
            })?;
        match compiled {
            Check::Single(cmd) => Ok(cmd),
            _ => Err(GateError::compile(format!(
                "expected simple command for reformat '{key}' at {}",
                or_root(path)
            ))),
        }
    }

    fn compile_group(&mut self, items: &[Value], path: &str, parallel: bool) -> Result<Check> {
        let checks = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.compile(item, &format!("{path}/{}", i + 1)).map(Into::into))
            .collect::<Result<Vec<_>>>()?;
        Ok(Check::Many(ManyChecks { checks, parallel }))
    }

    fn single(&mut self, mut cmd: Command, path: &str) -> Check {
        let base = cmd.base_name().to_string();
        cmd.name = self.numbered_name(base);
        cmd.path = or_root(path).to_string();
        Check::Single(cmd)
    }

    /// First occurrence keeps `name`; the n-th becomes `name:n`. A number
    /// already used by an explicit `name:n` elsewhere is skipped.
    fn numbered_name(&mut self, name: String) -> String {
        loop {
            let count = self.seen_names.entry(name.clone()).or_insert(0);
            *count += 1;
            let candidate = if *count == 1 {
                name.clone()
            } else {
                format!("{name}:{count}")
            };
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn sole_key_error(key: &str, path: &str) -> GateError {
    GateError::compile(format!("'{key}' must be the only key at {}", or_root(path)))
}

fn or_root(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Sequence(_) => "sequence".to_string(),
        Value::Mapping(_) => "mapping".to_string(),
        Value::Tagged(tagged) => format!("tagged value {}", tagged.tag),
    }
}

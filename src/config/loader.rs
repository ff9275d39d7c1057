// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_yaml::Value;
use tracing::debug;

use crate::check::Check;
use crate::config::compiler::compile;
use crate::config::template::{DEFAULT_FLOW, TemplateData, render};
use crate::errors::{GateError, Result};

/// Read the config text from `path`, or the built-in default flow.
pub fn load_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Unable to read config file \"{}\"", path.display()))?;
            Ok(text)
        }
        None => Ok(DEFAULT_FLOW.to_string()),
    }
}

/// Decode rendered YAML into an untyped document.
pub fn decode(rendered: &str) -> Result<Value> {
    serde_yaml::from_str(rendered).map_err(|err| {
        GateError::compile(format!(
            "Unable to parse config file: {err}\n=======\n{rendered}\n=======\n"
        ))
    })
}

/// Render, decode and compile a config.
///
/// This is the recommended entry point: read (or default), render with the
/// workspace template data, decode YAML, compile into a check tree.
pub fn load_and_compile(path: Option<&Path>, data: &TemplateData) -> Result<Check> {
    let source = load_source(path)?;
    let rendered = render(&source, data)?;
    debug!(bytes = rendered.len(), "rendered check config");
    let doc = decode(&rendered)?;
    compile(&doc).map_err(|err| match err {
        GateError::Compile(msg) => GateError::Compile(format!("Unable to parse config file: {msg}")),
        other => other,
    })
}

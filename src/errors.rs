// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Every variant is fatal to the run: the first error that reaches the
//! top-level stream consumer in [`crate::run`] ends it, and `main` turns it
//! into exit code 1.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    /// Malformed check config. The message names the offending path.
    #[error("{0}")]
    Compile(String),

    /// The workspace snapshot could not be built.
    #[error("Setup error: {0}")]
    Setup(String),

    /// A command exited non-zero, or broke its `expect_silence` contract.
    #[error("command '{name}' failed: {reason}")]
    CommandFailed { name: String, reason: String },

    /// Files still reported by a reformat check after the fix was attempted.
    #[error("The following files still need reformatting:\n{0}")]
    ReformatResidual(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GateError {
    pub fn compile(msg: impl Into<String>) -> Self {
        GateError::Compile(msg.into())
    }

    pub fn command_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        GateError::CommandFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GateError>;

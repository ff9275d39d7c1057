// src/config/mod.rs

//! Check config handling.
//!
//! - [`template`] renders the config text with workspace data.
//! - [`loader`] reads the file (or the built-in default) and decodes YAML.
//! - [`compiler`] turns the decoded document into a [`crate::check::Check`].

pub mod compiler;
pub mod loader;
pub mod template;

pub use compiler::{Compiler, compile};
pub use loader::{decode, load_and_compile, load_source};
pub use template::{DEFAULT_FLOW, TemplateData, render};

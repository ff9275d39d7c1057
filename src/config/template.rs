// src/config/template.rs

//! Template data and rendering for check configs.
//!
//! The config text is rendered with `minijinja` before it is decoded,
//! so commands can reference the change inventories of the workspace.
//! Every list `x` is also available space-joined as `_x_`.

use minijinja::Environment;
use serde::Serialize;

use crate::errors::Result;
use crate::workspace::{ChangeSet, Workspace};

/// Built-in flow: reformat changed files, then build, vet and compile the
/// tests of the changed packages.
pub const DEFAULT_FLOW: &str = r#"
{% if files %}
- reformat:
    check:
      name: fmt
      command: gofmt -l {{ _files_ }}
    format:
      name: reformat
      command: gofmt -w {{ _files_ }}
{% endif %}
- parallel:
{% if packages %}
    - run:
        name: build
        command: go build {{ _packages_ }}
    - run:
        name: vet
        command: go vet {{ _packages_ }}
{% endif %}
{% if packages %}
- run:
    name: test compile
    description: Compiling and initializing tests (but not running them)
    command: |
      go test -run non-existent-test-name-!!! {{ _packages_ }}
{% endif %}
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateData {
    pub files: Vec<String>,
    #[serde(rename = "_files_")]
    pub files_joined: String,
    pub dirs: Vec<String>,
    #[serde(rename = "_dirs_")]
    pub dirs_joined: String,
    pub trees: Vec<String>,
    #[serde(rename = "_trees_")]
    pub trees_joined: String,
    #[serde(rename = "topDirs")]
    pub top_dirs: Vec<String>,
    #[serde(rename = "_topDirs_")]
    pub top_dirs_joined: String,
    pub packages: Vec<String>,
    #[serde(rename = "_packages_")]
    pub packages_joined: String,
    #[serde(rename = "gitRoot")]
    pub git_root: String,
    #[serde(rename = "workRoot")]
    pub work_root: String,
    pub root: String,
}

impl TemplateData {
    pub fn new(changes: &ChangeSet, git_root: &str, work_root: &str, root: &str) -> Self {
        Self {
            files: changes.files.clone(),
            files_joined: changes.files.join(" "),
            dirs: changes.dirs.clone(),
            dirs_joined: changes.dirs.join(" "),
            trees: changes.trees.clone(),
            trees_joined: changes.trees.join(" "),
            top_dirs: changes.trees.clone(),
            top_dirs_joined: changes.trees.join(" "),
            packages: changes.units.clone(),
            packages_joined: changes.units.join(" "),
            git_root: git_root.to_string(),
            work_root: work_root.to_string(),
            root: root.to_string(),
        }
    }

    pub fn from_workspace(ws: &Workspace) -> Self {
        Self::new(
            ws.changes(),
            &ws.git_dir().to_string_lossy(),
            &ws.work_dir().to_string_lossy(),
            &ws.root_dir().to_string_lossy(),
        )
    }
}

/// Render `source` with `data`.
pub fn render(source: &str, data: &TemplateData) -> Result<String> {
    let env = Environment::new();
    Ok(env.render_str(source, data)?)
}

// src/workspace/paths.rs

//! Pure path helpers for building change inventories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Reduce `dirs` to the entries that no other entry contains.
///
/// Containment is by path component, so `a/b` is inside `a` but `a-b` and
/// `ab` are not. The result is sorted and free of duplicates.
pub fn shortest_prefixes<S: AsRef<str>>(dirs: &[S]) -> Vec<String> {
    // Component-wise ordering puts every directory directly before its
    // descendants, so one look-back is enough.
    let sorted: BTreeSet<PathBuf> = dirs.iter().map(|d| PathBuf::from(d.as_ref())).collect();

    let mut prefixes: Vec<String> = Vec::new();
    let mut last: Option<PathBuf> = None;
    for path in sorted {
        if let Some(prev) = &last {
            if path.starts_with(prev) {
                continue;
            }
        }
        prefixes.push(path.to_string_lossy().into_owned());
        last = Some(path);
    }
    prefixes
}

/// Paths named by `git diff --name-status` output.
///
/// Renames and copies contribute both their old and new path.
pub fn paths_from_name_status(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| line.split('\t').skip(1))
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Parent directory of a repository-relative file path; `.` for top-level
/// files.
pub fn dir_of(file: &str) -> String {
    match Path::new(file).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.to_string_lossy().into_owned()
        }
        _ => ".".to_string(),
    }
}

/// Directories of `files` that still exist under `root`, sorted.
pub fn existing_dirs<S: AsRef<str>>(root: &Path, files: &[S]) -> Vec<String> {
    let dirs: BTreeSet<String> = files.iter().map(|f| dir_of(f.as_ref())).collect();
    dirs.into_iter()
        .filter(|d| root.join(d).is_dir())
        .collect()
}

/// Sorted, de-duplicated copy.
pub fn sorted_unique(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_entries_collapse_into_their_parent() {
        assert_eq!(shortest_prefixes(&["a", "a/b", "c"]), vec!["a", "c"]);
    }

    #[test]
    fn siblings_are_not_prefixes_of_each_other() {
        assert_eq!(shortest_prefixes(&["a/b", "a/c"]), vec!["a/b", "a/c"]);
    }

    #[test]
    fn string_prefix_is_not_path_prefix() {
        assert_eq!(
            shortest_prefixes(&["a", "a-b", "a/b", "ab"]),
            vec!["a", "a-b", "ab"]
        );
    }

    #[test]
    fn name_status_includes_both_sides_of_a_rename() {
        let out = "M\tsrc/lib.go\nR100\told/x.go\tnew/x.go\nD\tgone/y.go\n";
        assert_eq!(
            paths_from_name_status(out),
            vec!["src/lib.go", "old/x.go", "new/x.go", "gone/y.go"]
        );
    }

    #[test]
    fn top_level_files_live_in_dot() {
        assert_eq!(dir_of("main.go"), ".");
        assert_eq!(dir_of("a/b/c.go"), "a/b");
    }
}

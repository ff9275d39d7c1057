use std::collections::HashMap;

use proptest::prelude::*;
use gitgate::check::{Check, Command, EMPTY_COMMAND_NAME, ManyChecks};
use gitgate::config::compile;
use gitgate::errors::{GateError, Result};

fn compile_str(yaml: &str) -> Result<Check> {
    let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    compile(&doc)
}

fn compile_err(yaml: &str) -> String {
    match compile_str(yaml) {
        Err(GateError::Compile(msg)) => msg,
        other => panic!("expected compile error for {yaml:?}, got {other:?}"),
    }
}

fn group(check: &Check) -> &ManyChecks {
    match check {
        Check::Many(group) => group,
        other => panic!("expected group, got {other:?}"),
    }
}

fn single(check: &Check) -> &Command {
    check
        .as_single()
        .unwrap_or_else(|| panic!("expected single command, got {check:?}"))
}

#[test]
fn bare_string_is_a_command_at_root() {
    let check = compile_str("ls").unwrap();
    let cmd = single(&check);
    assert_eq!(cmd.command, "ls");
    assert_eq!(cmd.name, "ls");
    assert_eq!(cmd.path, "/");
}

#[test]
fn repeated_names_are_numbered_in_order() {
    let check = compile_str("- ls\n- ls -l\n- ls -a\n").unwrap();
    let group = group(&check);
    assert!(!group.parallel);

    let names: Vec<_> = group.checks.iter().map(|c| single(c).name.clone()).collect();
    assert_eq!(names, vec!["ls", "ls:2", "ls:3"]);

    let paths: Vec<_> = group.checks.iter().map(|c| single(c).path.clone()).collect();
    assert_eq!(paths, vec!["/1", "/2", "/3"]);
}

#[test]
fn explicit_names_take_part_in_numbering() {
    let check = compile_str("- name: lint\n  command: golint\n- name: lint\n  command: staticcheck\n").unwrap();
    let names: Vec<_> = group(&check).checks.iter().map(|c| single(c).name.clone()).collect();
    assert_eq!(names, vec!["lint", "lint:2"]);
}

#[test]
fn generated_names_skip_explicit_numbered_names() {
    let check = compile_str("- name: ls:2\n  command: a\n- ls\n- ls\n").unwrap();
    let names: Vec<_> = group(&check).checks.iter().map(|c| single(c).name.clone()).collect();
    assert_eq!(names, vec!["ls:2", "ls", "ls:3"]);
}

#[test]
fn explicit_name_matching_a_generated_one_is_renumbered() {
    let check = compile_str("- ls\n- ls\n- name: ls:2\n  command: b\n").unwrap();
    let names: Vec<_> = group(&check).checks.iter().map(|c| single(c).name.clone()).collect();
    assert_eq!(names, vec!["ls", "ls:2", "ls:2:2"]);
}

#[test]
fn command_mapping_fields_are_decoded() {
    let check = compile_str(
        "command: gofmt -l .\nname: fmt\ndescription: Checking format\nexpect_silence: true\n",
    )
    .unwrap();
    let cmd = single(&check);
    assert_eq!(cmd.command, "gofmt -l .");
    assert_eq!(cmd.name, "fmt");
    assert_eq!(cmd.description(), Some("Checking format"));
    assert!(cmd.expect_silence);
}

#[test]
fn unknown_command_field_is_rejected() {
    let msg = compile_err("command: ls\nbogus: 1\n");
    assert!(msg.starts_with("unable to parse command at /: "), "{msg}");
}

#[test]
fn run_must_be_the_only_key() {
    assert_eq!(compile_err("command: ls\nrun: ls\n"), "'run' must be the only key at /");
}

#[test]
fn parallel_must_be_the_only_key() {
    assert_eq!(
        compile_err("- parallel: [a]\n  name: x\n"),
        "'parallel' must be the only key at /1"
    );
}

#[test]
fn empty_run_list_is_an_empty_sequential_group() {
    let check = compile_str("run: []").unwrap();
    let group = group(&check);
    assert!(!group.parallel);
    assert!(group.checks.is_empty());
}

#[test]
fn absent_parallel_value_is_an_empty_parallel_group() {
    let check = compile_str("parallel:").unwrap();
    let group = group(&check);
    assert!(group.parallel);
    assert!(group.checks.is_empty());
}

#[test]
fn absent_run_value_is_an_empty_command() {
    let check = compile_str("run:").unwrap();
    let cmd = single(&check);
    assert_eq!(cmd.command, "");
    assert_eq!(cmd.name, EMPTY_COMMAND_NAME);
}

#[test]
fn parallel_children_are_numbered_below_the_key() {
    let check = compile_str("- parallel:\n    - go build\n    - go vet\n").unwrap();
    let outer = group(&check);
    let inner = group(&outer.checks[0]);
    assert!(inner.parallel);
    let paths: Vec<_> = inner.checks.iter().map(|c| single(c).path.clone()).collect();
    assert_eq!(paths, vec!["/1/parallel/1", "/1/parallel/2"]);
    let names: Vec<_> = inner.checks.iter().map(|c| single(c).name.clone()).collect();
    assert_eq!(names, vec!["go", "go:2"]);
}

#[test]
fn nested_run_mapping_is_compiled_below_run() {
    let check = compile_str("run:\n  name: build\n  command: make\n").unwrap();
    let cmd = single(&check);
    assert_eq!(cmd.name, "build");
    assert_eq!(cmd.path, "/run");
}

#[test]
fn parallel_value_must_be_a_sequence() {
    assert_eq!(
        compile_err("parallel: go build"),
        "value for key 'parallel' must be an array at /"
    );
}

#[test]
fn scalar_run_value_is_rejected() {
    assert_eq!(compile_err("run: 5"), "unexpected type for 'run' at /: number 5");
}

#[test]
fn scalar_nodes_are_rejected_with_their_path() {
    assert_eq!(compile_err("- ls\n- 5\n"), "unexpected type: number 5 at /2");
}

#[test]
fn reformat_pair_compiles_both_slots() {
    let check = compile_str("reformat:\n  check: gofmt -l a.go\n  format: gofmt -w a.go\n").unwrap();
    match check {
        Check::Reformat(pair) => {
            assert_eq!(pair.check.command, "gofmt -l a.go");
            assert_eq!(pair.format.command, "gofmt -w a.go");
            assert_eq!(pair.check.name, "gofmt");
            assert_eq!(pair.format.name, "gofmt:2");
        }
        other => panic!("expected reformat, got {other:?}"),
    }
}

#[test]
fn reformat_slots_must_be_simple_commands() {
    assert_eq!(
        compile_err("reformat:\n  check: [a, b]\n  format: c\n"),
        "expected simple command for reformat 'check' at /"
    );
}

#[test]
fn reformat_slot_errors_are_wrapped() {
    let msg = compile_err("reformat:\n  check: a\n  format:\n    run: 3\n");
    assert!(msg.starts_with("could not parse reformat 'format' at /: "), "{msg}");
    assert!(msg.contains("unexpected type for 'run'"), "{msg}");
}

#[test]
fn reformat_rejects_unknown_keys() {
    assert_eq!(
        compile_err("reformat:\n  check: a\n  fmt: b\n"),
        "unexpected key string 'fmt' in 'reformat' at /"
    );
}

#[test]
fn reformat_must_be_the_only_key() {
    assert_eq!(
        compile_err("reformat:\n  check: a\n  format: b\nname: x\n"),
        "'reformat' must be the only key at /"
    );
}

#[test]
fn reformat_value_must_be_a_mapping() {
    assert_eq!(
        compile_err("reformat: gofmt"),
        "value for key 'reformat' must be an object at /"
    );
}

proptest! {
    /// The k-th command with a given base name is called `name` (k = 1) or
    /// `name:k`, and all compiled names are distinct.
    #[test]
    fn numbering_is_per_base_name(picks in proptest::collection::vec(0..4usize, 1..20)) {
        let words = ["fmt", "vet", "build", "lint"];
        let yaml: String = picks.iter().map(|&i| format!("- {} ./...\n", words[i])).collect();

        let check = compile_str(&yaml).unwrap();
        let names: Vec<String> = check.commands().iter().map(|c| c.name.clone()).collect();

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (&pick, name) in picks.iter().zip(&names) {
            let base = words[pick];
            let k = seen.entry(base).or_insert(0);
            *k += 1;
            let expected = if *k == 1 { base.to_string() } else { format!("{base}:{k}") };
            prop_assert_eq!(name, &expected);
        }

        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), names.len());
    }
}

use std::sync::Arc;
use std::time::Duration;

use gitgate::errors::GateError;
use gitgate::sched::{RunOptions, run_check};
use gitgate::workspace::ChangeSet;
use gitgate_test_utils::builders::{TestWorkspace, collect, par, reformat, seq, single};
use gitgate_test_utils::fake_executor::{ExecEvent, FakeExecutor};
use gitgate_test_utils::fake_restager::FakeRestager;
use gitgate_test_utils::{init_tracing, with_timeout};

fn finished_before_started(exec: &FakeExecutor, first: &str, second: &str) -> bool {
    let finished = exec.position(&ExecEvent::Finished(first.to_string()));
    let started = exec.position(&ExecEvent::Started(second.to_string()));
    matches!((finished, started), (Some(f), Some(s)) if f < s)
}

#[tokio::test]
async fn sequential_group_stops_after_first_failure() {
    init_tracing();
    let ws = TestWorkspace::new(ChangeSet::default());
    let exec = Arc::new(FakeExecutor::new().failing("c2"));
    let ctx = ws.context(exec.clone(), Arc::new(FakeRestager::new()), RunOptions::default());

    let tree = Arc::new(seq(vec![single("c1"), single("c2"), single("c3")]));
    let results = with_timeout(collect(run_check(ctx, tree))).await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(
        &results[1],
        Err(GateError::CommandFailed { name, .. }) if name == "c2"
    ));
    assert!(finished_before_started(&exec, "c1", "c2"));
    assert!(!exec.ran("c3"), "c3 must never start");
}

#[tokio::test]
async fn sequential_children_do_not_overlap() {
    init_tracing();
    let ws = TestWorkspace::new(ChangeSet::default());
    let exec = Arc::new(FakeExecutor::new().delayed("slow", Duration::from_millis(50)));
    let ctx = ws.context(exec.clone(), Arc::new(FakeRestager::new()), RunOptions::default());

    let tree = Arc::new(seq(vec![single("slow"), single("fast")]));
    let results = with_timeout(collect(run_check(ctx, tree))).await;

    assert!(results.iter().all(Result::is_ok));
    assert!(finished_before_started(&exec, "slow", "fast"));
}

#[tokio::test]
async fn parallel_group_launches_every_child_and_waits_for_all() {
    init_tracing();
    let ws = TestWorkspace::new(ChangeSet::default());
    let exec = Arc::new(
        FakeExecutor::new()
            .delayed("a", Duration::from_millis(100))
            .delayed("b", Duration::from_millis(50))
            .failing("c"),
    );
    let ctx = ws.context(exec.clone(), Arc::new(FakeRestager::new()), RunOptions::default());

    let tree = Arc::new(par(vec![single("a"), single("b"), single("c")]));
    let results = with_timeout(collect(run_check(ctx, tree))).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);

    // The stream only closed once every child had finished.
    let events = exec.events();
    for name in ["a", "b", "c"] {
        assert!(events.contains(&ExecEvent::Finished(name.to_string())), "{name} unfinished");
    }
    // All three were in flight together.
    let last_start = events
        .iter()
        .rposition(|e| matches!(e, ExecEvent::Started(_)))
        .unwrap();
    let first_finish = events
        .iter()
        .position(|e| matches!(e, ExecEvent::Finished(_)))
        .unwrap();
    assert!(last_start < first_finish, "{events:?}");
}

#[tokio::test]
async fn empty_groups_close_immediately() {
    init_tracing();
    let ws = TestWorkspace::new(ChangeSet::default());
    let exec = Arc::new(FakeExecutor::new());
    let ctx = ws.context(exec.clone(), Arc::new(FakeRestager::new()), RunOptions::default());

    let results = with_timeout(collect(run_check(ctx.clone(), Arc::new(seq(vec![]))))).await;
    assert!(results.is_empty());

    let results = with_timeout(collect(run_check(ctx, Arc::new(par(vec![]))))).await;
    assert!(results.is_empty());
    assert!(exec.events().is_empty());
}

#[tokio::test]
async fn later_step_waits_for_whole_parallel_group() {
    init_tracing();
    let ws = TestWorkspace::new(ChangeSet::default());
    let exec = Arc::new(
        FakeExecutor::new()
            .delayed("build", Duration::from_millis(60))
            .delayed("vet", Duration::from_millis(20)),
    );
    let ctx = ws.context(exec.clone(), Arc::new(FakeRestager::new()), RunOptions::default());

    let tree = Arc::new(seq(vec![
        par(vec![single("build"), single("vet")]),
        single("test"),
    ]));
    let results = with_timeout(collect(run_check(ctx, tree))).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(Result::is_ok));
    assert!(finished_before_started(&exec, "build", "test"));
    assert!(finished_before_started(&exec, "vet", "test"));
}

#[tokio::test]
async fn failure_inside_parallel_group_stops_outer_sequence() {
    init_tracing();
    let ws = TestWorkspace::new(ChangeSet::default());
    let exec = Arc::new(FakeExecutor::new().failing("vet"));
    let ctx = ws.context(exec.clone(), Arc::new(FakeRestager::new()), RunOptions::default());

    let tree = Arc::new(seq(vec![
        par(vec![single("build"), single("vet")]),
        single("test"),
    ]));
    let results = with_timeout(collect(run_check(ctx, tree))).await;

    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    assert!(!exec.ran("test"));
}

#[tokio::test]
async fn skipped_reformat_reports_success_without_running() {
    init_tracing();
    let changes = ChangeSet {
        files: vec!["a.go".into()],
        ..ChangeSet::default()
    };
    let ws = TestWorkspace::new(changes);
    let exec = Arc::new(FakeExecutor::new().outputs("gofmt -l a.go", &["a.go"]));
    let restager = Arc::new(FakeRestager::new());
    let options = RunOptions {
        skip_reformat: true,
        auto_fix: true,
    };
    let ctx = ws.context(exec.clone(), restager.clone(), options);

    let tree = Arc::new(reformat("gofmt -l a.go", "gofmt -w a.go"));
    let results = with_timeout(collect(run_check(ctx, tree))).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
    assert!(exec.events().is_empty());
    assert!(restager.calls().is_empty());
}

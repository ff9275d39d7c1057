// src/sched/runner.rs

//! Tree runner.
//!
//! [`run_check`] spawns one task per node and returns that node's result
//! stream. A group relays every result of every launched child into its own
//! stream and closes it only after all of its forwarders are done, so the
//! consumer sees each descendant outcome exactly once before completion.
//!
//! After a child reports an error, a group starts no further children.
//! Children already running are left to finish; nothing is cancelled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::check::{Check, ManyChecks};
use crate::errors::Result;
use crate::exec::Executor;
use crate::workspace::Workspace;

use super::reformat::reformat;
use super::restage::Restager;

/// Results of one node and all of its descendants. Closed when the node is
/// done.
pub type CheckStream = mpsc::UnboundedReceiver<Result<()>>;

type CheckSender = mpsc::UnboundedSender<Result<()>>;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Skip reformat nodes entirely (revision ranges cannot be restaged).
    pub skip_reformat: bool,
    /// Rewrite and restage non-conforming files instead of only reporting
    /// them.
    pub auto_fix: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            skip_reformat: false,
            auto_fix: true,
        }
    }
}

/// Everything a running node needs. Shared read-only by all tasks.
pub struct RunContext {
    pub workspace: Arc<Workspace>,
    pub executor: Arc<dyn Executor>,
    pub restager: Arc<dyn Restager>,
    pub options: RunOptions,
}

/// Start running `check` and return its result stream.
///
/// Must be called from within a Tokio runtime.
pub fn run_check(ctx: Arc<RunContext>, check: Arc<Check>) -> CheckStream {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(drive(ctx, check, tx));
    rx
}

/// Run one node. `tx` is dropped, closing the stream, when this returns.
fn drive(
    ctx: Arc<RunContext>,
    check: Arc<Check>,
    tx: CheckSender,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        match check.as_ref() {
            Check::Single(cmd) => {
                let result = ctx.executor.execute(&ctx.workspace, cmd).await;
                let _ = tx.send(result);
            }
            Check::Reformat(pair) => {
                if ctx.options.skip_reformat {
                    debug!(check = %pair.check.name, "reformat skipped");
                    let _ = tx.send(Ok(()));
                    return;
                }
                let result = reformat(&ctx, pair).await;
                let _ = tx.send(result);
            }
            Check::Many(group) => run_group(&ctx, group, &tx).await,
        }
    })
}

async fn run_group(ctx: &Arc<RunContext>, group: &ManyChecks, tx: &CheckSender) {
    let failed = Arc::new(AtomicBool::new(false));
    let mut forwarders = Vec::with_capacity(if group.parallel { group.checks.len() } else { 0 });

    for (i, child) in group.checks.iter().enumerate() {
        if failed.load(Ordering::SeqCst) {
            debug!(
                not_started = group.checks.len() - i,
                parallel = group.parallel,
                "failure observed; not starting remaining checks"
            );
            break;
        }

        let child_rx = run_check(Arc::clone(ctx), Arc::clone(child));
        let forwarder = spawn_forwarder(child_rx, tx.clone(), Arc::clone(&failed));

        if group.parallel {
            forwarders.push(forwarder);
        } else {
            join_forwarder(forwarder, tx, &failed).await;
        }
    }

    for forwarder in forwarders {
        join_forwarder(forwarder, tx, &failed).await;
    }
}

/// Relay every result of a child to the parent stream, flagging failures.
fn spawn_forwarder(
    mut child_rx: CheckStream,
    tx: CheckSender,
    failed: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(result) = child_rx.recv().await {
            if result.is_err() {
                failed.store(true, Ordering::SeqCst);
            }
            // The consumer may have stopped listening after an earlier error.
            let _ = tx.send(result);
        }
    })
}

async fn join_forwarder(forwarder: JoinHandle<()>, tx: &CheckSender, failed: &AtomicBool) {
    if let Err(err) = forwarder.await {
        error!(error = %err, "check forwarder panicked");
        failed.store(true, Ordering::SeqCst);
        let _ = tx.send(Err(anyhow!("check task panicked: {err}").into()));
    }
}

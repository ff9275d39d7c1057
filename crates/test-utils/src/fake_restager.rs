use std::sync::Mutex;

use gitgate::exec::ExecFuture;
use gitgate::sched::Restager;
use gitgate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestageCall {
    Confirm,
    Sync(Vec<String>),
    Review(Vec<String>),
    Stage(Vec<String>),
    Restore(Vec<String>),
}

/// A restager that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct FakeRestager {
    calls: Mutex<Vec<RestageCall>>,
}

impl FakeRestager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RestageCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Every file passed to `stage`.
    pub fn staged(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RestageCall::Stage(files) => Some(files),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn record(&self, call: RestageCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Restager for FakeRestager {
    fn confirm<'a>(&'a self, _prompt: &'a str) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            self.record(RestageCall::Confirm);
            Ok(())
        })
    }

    fn sync<'a>(&'a self, _ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            self.record(RestageCall::Sync(files.to_vec()));
            Ok(())
        })
    }

    fn review<'a>(&'a self, _ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            self.record(RestageCall::Review(files.to_vec()));
            Ok(())
        })
    }

    fn stage<'a>(&'a self, _ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            self.record(RestageCall::Stage(files.to_vec()));
            Ok(())
        })
    }

    fn restore<'a>(&'a self, _ws: &'a Workspace, files: &'a [String]) -> ExecFuture<'a, ()> {
        Box::pin(async move {
            self.record(RestageCall::Restore(files.to_vec()));
            Ok(())
        })
    }
}

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gitgate::check::Command;
use gitgate::errors::GateError;
use gitgate::exec::{ExecFuture, Executor};
use gitgate::workspace::Workspace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started(String),
    Finished(String),
}

/// A fake executor that:
/// - records when each command starts and finishes (by command text)
/// - returns scripted output, optionally after a delay
/// - fails the commands it was told to fail
#[derive(Debug, Default)]
pub struct FakeExecutor {
    events: Arc<Mutex<Vec<ExecEvent>>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    outputs: Mutex<HashMap<String, VecDeque<String>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, command: &str) -> Self {
        self.failing.insert(command.to_string());
        self
    }

    pub fn delayed(mut self, command: &str, delay: Duration) -> Self {
        self.delays.insert(command.to_string(), delay);
        self
    }

    /// Successive calls of `command` return `outputs` in order; the last one
    /// repeats.
    pub fn outputs(self, command: &str, outputs: &[&str]) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .insert(command.to_string(), outputs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Started(c) => Some(c),
                ExecEvent::Finished(_) => None,
            })
            .collect()
    }

    pub fn ran(&self, command: &str) -> bool {
        self.started().iter().any(|c| c == command)
    }

    /// Position of an event in the log.
    pub fn position(&self, event: &ExecEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    fn next_output(&self, command: &str) -> String {
        let mut outputs = self.outputs.lock().unwrap();
        match outputs.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => String::new(),
        }
    }
}

impl Executor for FakeExecutor {
    fn execute_with_output<'a>(
        &'a self,
        _ws: &'a Workspace,
        cmd: &'a Command,
    ) -> ExecFuture<'a, String> {
        Box::pin(async move {
            self.events
                .lock()
                .unwrap()
                .push(ExecEvent::Started(cmd.command.clone()));

            if let Some(delay) = self.delays.get(&cmd.command) {
                tokio::time::sleep(*delay).await;
            }
            let output = self.next_output(&cmd.command);

            self.events
                .lock()
                .unwrap()
                .push(ExecEvent::Finished(cmd.command.clone()));

            if self.failing.contains(&cmd.command) {
                return Err(GateError::command_failed(&cmd.name, "scripted failure"));
            }
            Ok(output)
        })
    }
}

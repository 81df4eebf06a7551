//! Scripted command runner.
//!
//! Rules are matched by substring against the rendered command line, in
//! registration order. Unmatched commands succeed with empty output.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use s3gate_env::{CommandOutput, CommandRunner, CommandSpec, EnvError};
use tokio::sync::Notify;

enum Reply {
    Output(CommandOutput),
    /// Never completes; notifies `hung` first.
    Hang,
}

struct Rule {
    needle: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<CommandSpec>>,
    hung: Arc<Notify>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same reply for every matching command.
    pub fn respond(self, needle: &str, output: CommandOutput) -> Self {
        self.push(needle, vec![Reply::Output(output)])
    }

    /// Replies in order; the last one repeats.
    pub fn respond_seq(self, needle: &str, outputs: Vec<CommandOutput>) -> Self {
        self.push(needle, outputs.into_iter().map(Reply::Output).collect())
    }

    /// Matching commands block forever.
    pub fn hang(self, needle: &str) -> Self {
        self.push(needle, vec![Reply::Hang])
    }

    fn push(self, needle: &str, replies: Vec<Reply>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_owned(),
            replies: replies.into(),
        });
        self
    }

    /// Notified when a command hits a `hang` rule.
    pub fn hung(&self) -> Arc<Notify> {
        Arc::clone(&self.hung)
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::command_line).collect()
    }

    /// Number of recorded commands containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|l| l.contains(needle))
            .count()
    }

    /// Indexes of recorded commands containing `needle`.
    pub fn positions(&self, needle: &str) -> Vec<usize> {
        self.command_lines()
            .iter()
            .enumerate()
            .filter(|(_, l)| l.contains(needle))
            .map(|(i, _)| i)
            .collect()
    }

    fn decide(&self, spec: &CommandSpec) -> Option<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        let line = spec.command_line();
        let mut rules = self.rules.lock().unwrap();
        let Some(rule) = rules.iter_mut().find(|r| line.contains(&r.needle)) else {
            return Some(CommandOutput::default());
        };
        let reply = if rule.replies.len() > 1 {
            rule.replies.pop_front()
        } else {
            rule.replies.front().map(|r| match r {
                Reply::Output(o) => Reply::Output(o.clone()),
                Reply::Hang => Reply::Hang,
            })
        };
        match reply {
            Some(Reply::Output(output)) => Some(output),
            Some(Reply::Hang) => None,
            None => Some(CommandOutput::default()),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, EnvError> {
        match self.decide(spec) {
            Some(output) => Ok(output),
            None => {
                self.hung.notify_one();
                std::future::pending().await
            }
        }
    }
}

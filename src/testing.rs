//! Fakes for the injected seams, used by the unit tests of the workflow
//! modules.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use anyhow::Result;

use crate::occ::{AdminTool, CommandOutput, OccError};
use crate::prompt::{Prompter, Validator};
use crate::report::Reporter;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub args: Vec<String>,
    pub capture: bool,
    pub fatal: bool,
    pub description: String,
}

/// Records every invocation instead of spawning processes. Stdout can be
/// scripted per subcommand; subcommands listed in `failing` exit non-zero.
#[derive(Default)]
pub struct FakeAdmin {
    pub calls: RefCell<Vec<RecordedCall>>,
    pub stdout: RefCell<HashMap<String, String>>,
    pub failing: RefCell<Vec<String>>,
}

impl FakeAdmin {
    pub fn with_stdout(subcommand: &str, stdout: &str) -> Self {
        let fake = Self::default();
        fake.stdout
            .borrow_mut()
            .insert(subcommand.to_string(), stdout.to_string());
        fake
    }

    pub fn calls_to(&self, subcommand: &str) -> Vec<RecordedCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.args.first().map(String::as_str) == Some(subcommand))
            .cloned()
            .collect()
    }
}

impl AdminTool for FakeAdmin {
    fn run(
        &self,
        args: &[&str],
        capture: bool,
        fatal: bool,
        description: &str,
    ) -> Result<Option<CommandOutput>, OccError> {
        self.calls.borrow_mut().push(RecordedCall {
            args: args.iter().map(|s| s.to_string()).collect(),
            capture,
            fatal,
            description: description.to_string(),
        });

        let subcommand = args.first().copied().unwrap_or_default();
        if self.failing.borrow().iter().any(|s| s == subcommand) {
            if fatal {
                return Err(OccError::Failed {
                    description: description.to_string(),
                    code: Some(1),
                    detail: "scripted failure".to_string(),
                });
            }
            return Ok(None);
        }

        let stdout = capture.then(|| {
            self.stdout
                .borrow()
                .get(subcommand)
                .cloned()
                .unwrap_or_default()
        });
        let stderr = capture.then(String::new);
        Ok(Some(CommandOutput {
            code: Some(0),
            stdout,
            stderr,
        }))
    }
}

/// One scripted operator answer; popped in order, panicking on any mismatch
/// between what the workflow asks and what the test expected it to ask.
#[derive(Debug, Clone)]
pub enum Answer {
    Text(String),
    Select(String),
    MultiSelect(Vec<String>),
    Confirm(bool),
    Password(String),
}

pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
}

impl ScriptedPrompter {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self {
            answers: answers.into(),
        }
    }

    fn next(&mut self, message: &str) -> Answer {
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected prompt: {}", message))
    }
}

impl Prompter for ScriptedPrompter {
    fn text(&mut self, message: &str, default: Option<&str>, validate: Validator) -> Result<String> {
        match self.next(message) {
            Answer::Text(answer) => {
                let answer = if answer.is_empty() {
                    default.unwrap_or_default().to_string()
                } else {
                    answer
                };
                if let Err(msg) = validate(&answer) {
                    panic!("scripted answer '{}' rejected: {}", answer, msg);
                }
                Ok(answer)
            }
            other => panic!("expected text answer for '{}', got {:?}", message, other),
        }
    }

    fn select(&mut self, message: &str, choices: &[String]) -> Result<String> {
        match self.next(message) {
            Answer::Select(answer) => {
                assert!(
                    choices.contains(&answer),
                    "scripted choice '{}' not offered for '{}' (choices: {:?})",
                    answer,
                    message,
                    choices
                );
                Ok(answer)
            }
            other => panic!("expected select answer for '{}', got {:?}", message, other),
        }
    }

    fn multi_select(&mut self, message: &str, choices: &[String]) -> Result<Vec<String>> {
        match self.next(message) {
            Answer::MultiSelect(answers) => {
                for answer in &answers {
                    assert!(
                        choices.contains(answer),
                        "scripted choice '{}' not offered for '{}'",
                        answer,
                        message
                    );
                }
                Ok(answers)
            }
            other => panic!("expected multi-select for '{}', got {:?}", message, other),
        }
    }

    fn confirm(&mut self, message: &str, _default: bool) -> Result<bool> {
        match self.next(message) {
            Answer::Confirm(answer) => Ok(answer),
            other => panic!("expected confirm answer for '{}', got {:?}", message, other),
        }
    }

    fn password(&mut self, message: &str) -> Result<String> {
        match self.next(message) {
            Answer::Password(answer) => Ok(answer),
            other => panic!("expected password for '{}', got {:?}", message, other),
        }
    }
}

#[derive(Default)]
pub struct MemReporter {
    events: RefCell<Vec<(&'static str, String, String)>>,
}

impl MemReporter {
    fn with_severity(&self, severity: &str) -> Vec<(String, String)> {
        self.events
            .borrow()
            .iter()
            .filter(|(s, _, _)| *s == severity)
            .map(|(_, title, msg)| (title.clone(), msg.clone()))
            .collect()
    }

    pub fn infos(&self) -> Vec<(String, String)> {
        self.with_severity("info")
    }

    pub fn warnings(&self) -> Vec<(String, String)> {
        self.with_severity("warning")
    }
}

impl Reporter for MemReporter {
    fn info(&self, title: &str, message: &str) {
        self.events
            .borrow_mut()
            .push(("info", title.to_string(), message.to_string()));
    }

    fn warning(&self, title: &str, message: &str) {
        self.events
            .borrow_mut()
            .push(("warning", title.to_string(), message.to_string()));
    }

    fn error(&self, title: &str, message: &str) {
        self.events
            .borrow_mut()
            .push(("error", title.to_string(), message.to_string()));
    }
}

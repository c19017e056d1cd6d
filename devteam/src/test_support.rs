//! Test-only helpers: scripted generators and environment probes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use crate::io::generator::{GenerationError, Generator};

/// Generator that replays queued replies in order and records every prompt.
///
/// Running out of replies is reported as a [`GenerationError::Response`].
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: RefCell<VecDeque<String>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: RefCell::new(replies.into_iter().map(Into::into).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| GenerationError::Response("scripted replies exhausted".to_string()))
    }
}

/// Generator whose backend is always unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingGenerator;

impl Generator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Transport(
            "connection refused".to_string(),
        ))
    }
}

/// Panic unless a `python3` interpreter can be spawned.
///
/// Sandbox execution checks need a real interpreter; a missing one is a broken
/// test environment, not a pass.
pub fn require_python() {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    let found = *AVAILABLE.get_or_init(|| {
        Command::new("python3")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    });
    assert!(
        found,
        "python3 is required on PATH to run sandbox execution tests"
    );
}

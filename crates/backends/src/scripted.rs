//! Scripted backend — replays a fixed sequence of outcomes.
//!
//! Each `generate` call consumes the next [`ScriptStep`]. Steps can reply,
//! fail with a specific [`BackendError`], or hang forever (to exercise
//! timeouts). Once the script is exhausted the backend either starts over
//! (`cycling`) or fails every further call.

use async_trait::async_trait;
use roleplay_core::backend::{Backend, GenerateOptions};
use roleplay_core::error::BackendError;
use std::sync::Mutex;

/// One scripted outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Reply(String),
    Fail(BackendError),
    Hang,
}

impl ScriptStep {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }
}

pub struct ScriptedBackend {
    steps: Vec<ScriptStep>,
    cycle: bool,
    state: Mutex<ScriptState>,
}

#[derive(Default)]
struct ScriptState {
    next: usize,
    prompts: Vec<String>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            cycle: false,
            state: Mutex::new(ScriptState::default()),
        }
    }

    /// Replies only, in order.
    pub fn replies<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(ScriptStep::reply).collect())
    }

    /// Start over from the first step once the script runs out.
    pub fn cycling(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.state.lock().map(|s| s.prompts.len()).unwrap_or(0)
    }

    /// Every prompt received, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().map(|s| s.prompts.clone()).unwrap_or_default()
    }

    fn next_step(&self, prompt: &str) -> Result<ScriptStep, BackendError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BackendError::Provider("script state poisoned".into()))?;
        state.prompts.push(prompt.to_string());

        if self.steps.is_empty() {
            return Err(BackendError::Provider("script is empty".into()));
        }
        if state.next >= self.steps.len() {
            if !self.cycle {
                return Err(BackendError::Provider(format!(
                    "script exhausted after {} steps",
                    self.steps.len()
                )));
            }
            state.next = 0;
        }

        let step = self.steps[state.next].clone();
        state.next += 1;
        Ok(step)
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, BackendError> {
        match self.next_step(prompt)? {
            ScriptStep::Reply(text) => Ok(text),
            ScriptStep::Fail(err) => Err(err),
            ScriptStep::Hang => std::future::pending().await,
        }
    }
}

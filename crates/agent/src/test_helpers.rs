//! Shared test helpers for agent tests.

use roleplay_core::backend::{Backend, GenerateOptions};
use roleplay_core::error::BackendError;
use std::sync::Mutex;

/// A mock backend that returns a sequence of scripted results.
///
/// Each call to `generate` returns the next result in the queue and records
/// the prompt it was given. Panics if more calls are made than results provided.
pub struct SequentialMockBackend {
    results: Mutex<Vec<Result<String, BackendError>>>,
    prompts: Mutex<Vec<String>>,
}

impl SequentialMockBackend {
    pub fn new(results: Vec<Result<String, BackendError>>) -> Self {
        Self {
            results: Mutex::new(results),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a backend that replies with each text in turn.
    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl Backend for SequentialMockBackend {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> Result<String, BackendError> {
        let mut prompts = self.prompts.lock().unwrap();
        let results = self.results.lock().unwrap();
        let index = prompts.len();

        if index >= results.len() {
            panic!(
                "SequentialMockBackend: no more results (call #{}, have {})",
                index,
                results.len()
            );
        }

        prompts.push(prompt.to_string());
        results[index].clone()
    }
}

/// A backend that never answers.
pub struct StalledBackend;

#[async_trait::async_trait]
impl Backend for StalledBackend {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String, BackendError> {
        std::future::pending().await
    }
}

//! Backend trait — the abstraction over text-generation providers.
//!
//! A Backend turns a prompt into text. The dialogue engine never knows which
//! concrete provider sits behind it; HTTP clients and API keys live outside
//! this workspace.
//!
//! The same capability doubles as the optional memory summarizer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::BackendError;

/// Per-call generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Temperature (0.0 = deterministic, higher = more creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub stop_sequences: BTreeSet<String>,
}

fn default_temperature() -> f32 {
    0.7
}

impl GenerateOptions {
    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Add a stop sequence.
    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.insert(stop.into());
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: None,
            stop_sequences: BTreeSet::new(),
        }
    }
}

/// The core Backend trait.
///
/// Every text-generation provider implements this trait. Agents call
/// `generate()` without knowing which provider is being used.
#[async_trait]
pub trait Backend: Send + Sync {
    /// A human-readable name for this backend (e.g., "template", "openai").
    fn name(&self) -> &str;

    /// Generate text for a prompt.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<String, BackendError>;

    /// Whether the backend is reachable.
    async fn health_check(&self) -> std::result::Result<bool, BackendError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_options_defaults() {
        let opts = GenerateOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert!(opts.max_tokens.is_none());
        assert!(opts.stop_sequences.is_empty());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: GenerateOptions =
            serde_json::from_str(r#"{"stop_sequences":["END","END"]}"#).unwrap();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.stop_sequences.len(), 1);
    }
}

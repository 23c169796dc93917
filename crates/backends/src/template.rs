//! Template backend — fills a fixed reply template.
//!
//! Placeholders: `{name}` is the speaking character, `{call}` the 1-based
//! number of this call. Useful for demos and for exercising the engine
//! without any model at all.

use async_trait::async_trait;
use roleplay_core::backend::{Backend, GenerateOptions};
use roleplay_core::error::BackendError;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct TemplateBackend {
    speaker: String,
    template: String,
    calls: AtomicU64,
}

impl TemplateBackend {
    pub fn new(speaker: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            template: template.into(),
            calls: AtomicU64::new(0),
        }
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn render(&self, call: u64) -> String {
        self.template
            .replace("{name}", &self.speaker)
            .replace("{call}", &call.to_string())
    }
}

#[async_trait]
impl Backend for TemplateBackend {
    fn name(&self) -> &str {
        "template"
    }

    async fn generate(&self, _prompt: &str, _options: &GenerateOptions) -> Result<String, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(self.render(call))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fills_placeholders() {
        let backend = TemplateBackend::new("A", "OK from {name}");
        let text = backend.generate("ignored", &GenerateOptions::default()).await.unwrap();
        assert_eq!(text, "OK from A");
    }

    #[tokio::test]
    async fn call_counter_advances() {
        let backend = TemplateBackend::new("Mira", "{name} #{call}");
        let opts = GenerateOptions::default();
        assert_eq!(backend.generate("", &opts).await.unwrap(), "Mira #1");
        assert_eq!(backend.generate("", &opts).await.unwrap(), "Mira #2");
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn template_without_placeholders_is_verbatim() {
        let backend = TemplateBackend::new("Mira", "Hello.");
        assert_eq!(
            backend.generate("", &GenerateOptions::default()).await.unwrap(),
            "Hello."
        );
    }
}

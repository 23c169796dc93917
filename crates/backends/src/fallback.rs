//! Backend fallback — ordered chain with per-backend timeouts.
//!
//! When a backend fails (timeout, rate limit, error), automatically tries the
//! next backend in the chain. The last error is returned if all fail.

use async_trait::async_trait;
use roleplay_core::backend::{Backend, GenerateOptions};
use roleplay_core::error::BackendError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A backend that wraps an ordered list of backends and falls back on failure.
pub struct FallbackBackend {
    name: String,
    chain: Vec<FallbackEntry>,
}

/// A single entry in the fallback chain.
struct FallbackEntry {
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

impl FallbackBackend {
    /// Create a new fallback backend with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Add a backend to the chain with a custom timeout.
    pub fn add(mut self, backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        self.chain.push(FallbackEntry { backend, timeout });
        self
    }

    /// Add a backend with the default timeout (30s).
    pub fn add_default(self, backend: Arc<dyn Backend>) -> Self {
        self.add(backend, Duration::from_secs(30))
    }
}

#[async_trait]
impl Backend for FallbackBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, BackendError> {
        let mut last_error = BackendError::Provider("no backends in fallback chain".into());

        for (i, entry) in self.chain.iter().enumerate() {
            let backend_name = entry.backend.name().to_string();

            debug!(
                backend = %backend_name,
                attempt = i + 1,
                total = self.chain.len(),
                "Fallback: trying backend"
            );

            match tokio::time::timeout(entry.timeout, entry.backend.generate(prompt, options)).await {
                Ok(Ok(text)) => return Ok(text),
                Ok(Err(e)) => {
                    warn!(
                        backend = %backend_name,
                        error = %e,
                        "Fallback: backend failed, trying next"
                    );
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        backend = %backend_name,
                        timeout_ms = entry.timeout.as_millis() as u64,
                        "Fallback: backend timed out, trying next"
                    );
                    last_error = BackendError::Timeout(format!(
                        "backend '{}' timed out after {}ms",
                        backend_name,
                        entry.timeout.as_millis()
                    ));
                }
            }
        }

        Err(last_error)
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        for entry in &self.chain {
            if let Ok(true) = entry.backend.health_check().await {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

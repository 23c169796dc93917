//! A single character: observe what others say, respond when asked.

use std::sync::Arc;
use std::time::Duration;

use roleplay_core::backend::{Backend, GenerateOptions};
use roleplay_core::entry::{MemoryEntry, Window, WindowBound};
use roleplay_core::error::{AgentError, BackendError, MemoryError};
use roleplay_core::personality::Personality;
use roleplay_memory::{Memory, MemoryPolicy};
use tracing::{debug, warn};

use crate::prompt::build_prompt;

/// Everything the environment shows a speaker for one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    /// Most recent transcript entries, oldest first
    pub transcript: Window<'a>,

    /// Scene description, if any
    pub scene: Option<&'a str>,

    /// 1-based round this turn belongs to
    pub round: u32,

    /// Upper bound on the backend call
    pub timeout: Option<Duration>,
}

impl<'a> TurnContext<'a> {
    pub fn new(transcript: Window<'a>) -> Self {
        Self {
            transcript,
            scene: None,
            round: 1,
            timeout: None,
        }
    }

    pub fn with_scene(mut self, scene: &'a str) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// The new entry; its sequence id is assigned by whoever records it
    pub entry: MemoryEntry,

    /// Set when remembering the utterance degraded the speaker's memory
    pub degraded: Option<MemoryError>,
}

/// One character in a scene.
pub struct Agent {
    personality: Arc<Personality>,
    backend: Arc<dyn Backend>,
    memory: Memory,
    options: GenerateOptions,
    memory_window: WindowBound,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.personality.name())
            .field("backend", &self.backend.name())
            .field("memory", &self.memory)
            .finish()
    }
}

impl Agent {
    /// Create an agent with an empty memory.
    pub fn new(
        personality: Arc<Personality>,
        backend: Arc<dyn Backend>,
        memory_policy: MemoryPolicy,
    ) -> Result<Self, MemoryError> {
        let memory = Memory::new(personality.name(), memory_policy)?;
        Ok(Self {
            personality,
            backend,
            memory,
            options: GenerateOptions::default(),
            memory_window: WindowBound::Entries(20),
        })
    }

    /// Set the generation options used for every turn.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Set how much of its own memory the agent puts in its prompt.
    pub fn with_memory_window(mut self, bound: WindowBound) -> Self {
        self.memory_window = bound;
        self
    }

    /// Summarize evicted memory with `summarizer` instead of truncating.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Backend>) -> Self {
        self.memory.set_summarizer(Some(summarizer));
        self
    }

    /// Record an entry in private memory.
    ///
    /// Never fails; returns the degraded-mode signal if eviction had to fall
    /// back to truncation.
    pub async fn observe(&mut self, entry: MemoryEntry) -> Option<MemoryError> {
        let report = self.memory.append(entry).await;
        if let Some(err) = &report.degraded {
            warn!(agent = %self.name(), error = %err, "Memory degraded");
        }
        report.degraded
    }

    /// Produce the next line of dialogue.
    ///
    /// On failure nothing is remembered and the backend error is returned
    /// wrapped with this agent's name.
    pub async fn respond(&mut self, ctx: &TurnContext<'_>) -> Result<Utterance, AgentError> {
        let prompt = build_prompt(
            &self.personality,
            ctx.scene,
            self.memory.window(self.memory_window),
            ctx.transcript,
        );

        debug!(
            agent = %self.name(),
            round = ctx.round,
            transcript_entries = ctx.transcript.len(),
            prompt_chars = prompt.len(),
            "Generating response"
        );

        let text = self
            .generate(&prompt, ctx.timeout)
            .await
            .map_err(|cause| AgentError::new(self.name(), cause))?;

        let entry = MemoryEntry::utterance(self.name(), text);
        let degraded = self.observe(entry.clone()).await;
        Ok(Utterance { entry, degraded })
    }

    async fn generate(&self, prompt: &str, timeout: Option<Duration>) -> Result<String, BackendError> {
        let call = self.backend.generate(prompt, &self.options);
        let raw = match timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                BackendError::Timeout(format!(
                    "{} gave no response within {}ms",
                    self.backend.name(),
                    limit.as_millis()
                ))
            })??,
            None => call.await?,
        };

        let text = clean_reply(&raw, self.name());
        if text.is_empty() {
            return Err(BackendError::InvalidResponse(format!(
                "{} returned an empty response",
                self.backend.name()
            )));
        }
        Ok(text)
    }

    pub fn name(&self) -> &str {
        self.personality.name()
    }

    pub fn personality(&self) -> &Arc<Personality> {
        &self.personality
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }
}

/// Trim the reply and drop an echoed `"Name:"` prefix.
fn clean_reply(raw: &str, name: &str) -> String {
    let trimmed = raw.trim();
    let unprefixed = trimmed
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(trimmed);
    unprefixed.trim().to_string()
}

//! Bounded memory — an append-only, capacity-limited record with
//! summarizing eviction.
//!
//! When an append would exceed capacity, the oldest `batch_size` entries are
//! collapsed into one `Observation` entry spoken by [`SUMMARY_SPEAKER`]. The
//! summary text comes from an optional summarizer backend; without one (or
//! when it fails) the batch is concatenated and truncated instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use roleplay_core::backend::{Backend, GenerateOptions};
use roleplay_core::entry::{EntryKind, MemoryEntry, Window, WindowBound};
use roleplay_core::error::MemoryError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::summary::{clip, summary_prompt, truncate_summary};

/// Speaker name carried by synthetic summary entries.
pub const SUMMARY_SPEAKER: &str = "memory";

/// Capacity and eviction settings for a [`Memory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPolicy {
    /// Maximum number of entries held at any time
    pub capacity: usize,

    /// How many of the oldest entries one compaction collapses
    pub batch_size: usize,

    /// Upper bound on the length of a summary, in characters
    pub summary_max_chars: usize,

    /// How long a summarizer call may take before falling back
    pub summarize_timeout: Duration,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            capacity: 50,
            batch_size: 10,
            summary_max_chars: 600,
            summarize_timeout: Duration::from_secs(20),
        }
    }
}

impl MemoryPolicy {
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        Self {
            capacity,
            batch_size,
            ..Self::default()
        }
    }

    pub fn with_summary_max_chars(mut self, max_chars: usize) -> Self {
        self.summary_max_chars = max_chars;
        self
    }

    pub fn with_summarize_timeout(mut self, timeout: Duration) -> Self {
        self.summarize_timeout = timeout;
        self
    }

    /// A compaction at capacity C leaves C - B + 1 entries, and the pending
    /// append adds one more, so B must be at least 2.
    pub fn validate(&self) -> Result<(), MemoryError> {
        if self.capacity < 2 {
            return Err(MemoryError::InvalidPolicy(format!(
                "capacity must be at least 2, got {}",
                self.capacity
            )));
        }
        if self.batch_size < 2 || self.batch_size > self.capacity {
            return Err(MemoryError::InvalidPolicy(format!(
                "batch_size must be between 2 and capacity ({}), got {}",
                self.capacity, self.batch_size
            )));
        }
        if self.summary_max_chars == 0 {
            return Err(MemoryError::InvalidPolicy(
                "summary_max_chars must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of [`Memory::append`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppendReport {
    /// Sequence id assigned to the stored entry
    pub sequence_id: u64,

    /// Set when the append triggered a compaction that fell back to truncation
    pub degraded: Option<MemoryError>,
}

/// Counts describing what a memory currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub total: usize,
    pub capacity: usize,
    pub by_kind: HashMap<EntryKind, usize>,
    pub summaries: usize,
}

/// One character's private memory.
pub struct Memory {
    owner: String,
    policy: MemoryPolicy,
    entries: Vec<MemoryEntry>,
    next_sequence: u64,
    summarizer: Option<Arc<dyn Backend>>,
    summary_options: GenerateOptions,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("owner", &self.owner)
            .field("policy", &self.policy)
            .field("len", &self.entries.len())
            .field("summarizer", &self.summarizer.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl Memory {
    /// Create an empty memory for `owner`.
    pub fn new(owner: impl Into<String>, policy: MemoryPolicy) -> Result<Self, MemoryError> {
        policy.validate()?;
        Ok(Self {
            owner: owner.into(),
            policy,
            entries: Vec::new(),
            next_sequence: 1,
            summarizer: None,
            summary_options: GenerateOptions::default().with_temperature(0.2),
        })
    }

    /// Use a backend to summarize evicted batches.
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Backend>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn set_summarizer(&mut self, summarizer: Option<Arc<dyn Backend>>) {
        self.summarizer = summarizer;
    }

    /// Store an entry, compacting first if the memory is full.
    ///
    /// The entry's `sequence_id` is overwritten with the next local id.
    pub async fn append(&mut self, mut entry: MemoryEntry) -> AppendReport {
        let degraded = if self.entries.len() >= self.policy.capacity {
            self.compact().await
        } else {
            None
        };

        let sequence_id = self.next_sequence;
        self.next_sequence += 1;
        entry.sequence_id = sequence_id;
        self.entries.push(entry);

        AppendReport {
            sequence_id,
            degraded,
        }
    }

    /// Collapse the oldest `batch_size` entries into one summary entry.
    ///
    /// Returns the degraded-mode error when a configured summarizer failed
    /// and truncation was used instead. Memory is untouched until the summary
    /// text is ready, so dropping this future mid-way changes nothing.
    pub async fn compact(&mut self) -> Option<MemoryError> {
        let batch = self.policy.batch_size.min(self.entries.len());
        if batch < 2 {
            return None;
        }

        let (content, degraded) = self.summarize(&self.entries[..batch]).await;

        let oldest = &self.entries[0];
        let mut summary = MemoryEntry::observation(SUMMARY_SPEAKER, content);
        summary.sequence_id = oldest.sequence_id;
        summary.timestamp = oldest.timestamp;

        self.entries.splice(..batch, std::iter::once(summary));
        debug!(
            owner = %self.owner,
            evicted = batch,
            remaining = self.entries.len(),
            "Memory compacted"
        );
        degraded
    }

    async fn summarize(&self, batch: &[MemoryEntry]) -> (String, Option<MemoryError>) {
        let max_chars = self.policy.summary_max_chars;
        let Some(summarizer) = &self.summarizer else {
            return (truncate_summary(batch, max_chars), None);
        };

        let prompt = summary_prompt(&self.owner, batch, max_chars);
        let call = summarizer.generate(&prompt, &self.summary_options);
        let error = match tokio::time::timeout(self.policy.summarize_timeout, call).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                return (clip(text.trim(), max_chars), None);
            }
            Ok(Ok(_)) => MemoryError::SummarizationFailed("summarizer returned empty text".into()),
            Ok(Err(e)) => MemoryError::SummarizationFailed(e.to_string()),
            Err(_) => MemoryError::SummarizationTimedOut {
                timeout_ms: self.policy.summarize_timeout.as_millis() as u64,
            },
        };

        warn!(
            owner = %self.owner,
            summarizer = summarizer.name(),
            error = %error,
            "Summarization failed, falling back to truncation"
        );
        (truncate_summary(batch, max_chars), Some(error))
    }

    /// The most recent entries within `bound`, oldest first.
    pub fn window(&self, bound: WindowBound) -> Window<'_> {
        Window::over(&self.entries, bound)
    }

    /// The most recent `limit` entries spoken by `speaker`, oldest first.
    pub fn entries_from(&self, speaker: &str, limit: usize) -> Vec<&MemoryEntry> {
        let mut found: Vec<&MemoryEntry> = self
            .entries
            .iter()
            .rev()
            .filter(|e| e.speaker == speaker)
            .take(limit)
            .collect();
        found.reverse();
        found
    }

    pub fn stats(&self) -> MemoryStats {
        let mut by_kind = HashMap::new();
        for entry in &self.entries {
            *by_kind.entry(entry.kind).or_insert(0) += 1;
        }
        MemoryStats {
            total: self.entries.len(),
            capacity: self.policy.capacity,
            by_kind,
            summaries: self
                .entries
                .iter()
                .filter(|e| e.speaker == SUMMARY_SPEAKER && e.kind == EntryKind::Observation)
                .count(),
        }
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Sequence ids keep increasing across a clear.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn policy(&self) -> &MemoryPolicy {
        &self.policy
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

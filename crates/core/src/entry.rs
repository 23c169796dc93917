//! Memory entries and windows — the value objects that flow through a session.
//!
//! The same `MemoryEntry` shape is used by the shared transcript and by each
//! agent's private memory. A `Window` is a read-only view over the most recent
//! entries of either, bounded by entry count or by estimated tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::token::estimate_entry_tokens;

/// What an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Something a character said
    Utterance,
    /// Something a character noticed (includes memory summaries)
    Observation,
    /// Narration or instructions from the environment
    System,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utterance => "utterance",
            Self::Observation => "observation",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in a transcript or memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Position in the owning sequence (transcript or memory)
    pub sequence_id: u64,

    /// Who produced it
    pub speaker: String,

    /// The text content
    pub content: String,

    /// What kind of entry this is
    pub kind: EntryKind,

    /// Wall-clock time of creation
    pub timestamp: DateTime<Utc>,
}

impl MemoryEntry {
    /// Create an entry without a sequence id; the owner assigns one on append.
    pub fn new(speaker: impl Into<String>, content: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            sequence_id: 0,
            speaker: speaker.into(),
            content: content.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Create a new utterance entry.
    pub fn utterance(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(speaker, content, EntryKind::Utterance)
    }

    /// Create a new observation entry.
    pub fn observation(speaker: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(speaker, content, EntryKind::Observation)
    }

    /// Create a new system entry.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content, EntryKind::System)
    }

    /// One-line rendering used in prompts: `[kind] speaker: content`.
    pub fn render_line(&self) -> String {
        match self.kind {
            EntryKind::Utterance => format!("{}: {}", self.speaker, self.content),
            kind => format!("[{}] {}: {}", kind, self.speaker, self.content),
        }
    }
}

/// How far back a window reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowBound {
    /// At most this many entries
    Entries(usize),
    /// At most this many estimated tokens
    Tokens(usize),
}

impl Default for WindowBound {
    fn default() -> Self {
        Self::Entries(12)
    }
}

/// A read-only, chronological view over the most recent entries of a sequence.
///
/// Iteration is lazy and restartable: `iter()` may be called any number of
/// times and always yields the same entries, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    entries: &'a [MemoryEntry],
}

impl<'a> Window<'a> {
    /// Select the newest entries of `entries` (which must be chronological)
    /// that fit within `bound`.
    pub fn over(entries: &'a [MemoryEntry], bound: WindowBound) -> Self {
        let start = match bound {
            WindowBound::Entries(max) => entries.len().saturating_sub(max),
            WindowBound::Tokens(max) => {
                let mut used = 0usize;
                let mut start = entries.len();
                for entry in entries.iter().rev() {
                    let cost = estimate_entry_tokens(entry);
                    if used + cost > max {
                        break;
                    }
                    used += cost;
                    start -= 1;
                }
                start
            }
        };
        Self {
            entries: &entries[start..],
        }
    }

    /// An empty window.
    pub fn empty() -> Self {
        Self { entries: &[] }
    }

    pub fn iter(&self) -> std::slice::Iter<'a, MemoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render one line per entry, oldest first.
    pub fn render(&self) -> String {
        self.iter()
            .map(MemoryEntry::render_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for Window<'a> {
    type Item = &'a MemoryEntry;
    type IntoIter = std::slice::Iter<'a, MemoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &Window<'a> {
    type Item = &'a MemoryEntry;
    type IntoIter = std::slice::Iter<'a, MemoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: u64) -> Vec<MemoryEntry> {
        (1..=n)
            .map(|i| {
                let mut e = MemoryEntry::utterance("A", format!("line {i}"));
                e.sequence_id = i;
                e
            })
            .collect()
    }

    #[test]
    fn entry_window_keeps_newest_in_order() {
        let entries = numbered(5);
        let window = Window::over(&entries, WindowBound::Entries(3));
        let ids: Vec<u64> = window.iter().map(|e| e.sequence_id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn window_larger_than_sequence_returns_everything() {
        let entries = numbered(2);
        let window = Window::over(&entries, WindowBound::Entries(10));
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn window_is_restartable() {
        let entries = numbered(4);
        let window = Window::over(&entries, WindowBound::Entries(2));
        let first: Vec<_> = window.iter().collect();
        let second: Vec<_> = window.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn token_window_stops_before_overflow() {
        // "line N" is 6 chars → 2 tokens + 4 overhead = 6 tokens each
        let entries = numbered(5);
        let window = Window::over(&entries, WindowBound::Tokens(13));
        let ids: Vec<u64> = window.iter().map(|e| e.sequence_id).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[test]
    fn zero_token_window_is_empty() {
        let entries = numbered(3);
        assert!(Window::over(&entries, WindowBound::Tokens(0)).is_empty());
    }

    #[test]
    fn render_line_marks_non_utterances() {
        let spoken = MemoryEntry::utterance("Alice", "Hi");
        let narrated = MemoryEntry::system("The tavern is loud");
        assert_eq!(spoken.render_line(), "Alice: Hi");
        assert_eq!(narrated.render_line(), "[system] system: The tavern is loud");
    }

    #[test]
    fn entry_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntryKind::Observation).unwrap();
        assert_eq!(json, "\"observation\"");
    }
}

//! The shared, append-only record of what was said in a session.

use roleplay_core::entry::{EntryKind, MemoryEntry, Window, WindowBound};
use serde::{Deserialize, Serialize};

/// Export shape of one transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub sequence_id: u64,
    pub speaker: String,
    pub content: String,
    pub kind: EntryKind,
}

impl From<&MemoryEntry> for ExportedEntry {
    fn from(entry: &MemoryEntry) -> Self {
        Self {
            sequence_id: entry.sequence_id,
            speaker: entry.speaker.clone(),
            content: entry.content.clone(),
            kind: entry.kind,
        }
    }
}

/// Totally ordered, append-only sequence of entries.
///
/// Sequence ids start at 1 and are assigned here, never by the caller.
#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Vec<MemoryEntry>,
    next_sequence: u64,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 1,
        }
    }

    /// Append an entry, returning the sequence id it was given.
    pub fn append(&mut self, mut entry: MemoryEntry) -> u64 {
        let id = self.next_sequence;
        self.next_sequence += 1;
        entry.sequence_id = id;
        self.entries.push(entry);
        id
    }

    /// The most recent entries within `bound`, oldest first.
    pub fn window(&self, bound: WindowBound) -> Window<'_> {
        Window::over(&self.entries, bound)
    }

    /// Read-only dump of every entry, in order.
    pub fn export(&self) -> Vec<ExportedEntry> {
        self.entries.iter().map(ExportedEntry::from).collect()
    }

    /// Serialize the export as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export())
    }

    /// The last `limit` entries, optionally only those by `speaker`, oldest first.
    pub fn history(&self, limit: usize, speaker: Option<&str>) -> Vec<&MemoryEntry> {
        let mut found: Vec<&MemoryEntry> = self
            .entries
            .iter()
            .rev()
            .filter(|e| speaker.is_none_or(|s| e.speaker == s))
            .take(limit)
            .collect();
        found.reverse();
        found
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&MemoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything and restart numbering at 1.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_sequence = 1;
    }
}

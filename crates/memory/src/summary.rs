//! Summary text for evicted memory batches.
//!
//! Two flavours: a prompt handed to a summarizer backend, and a purely
//! extractive concatenate-and-truncate fallback.

use roleplay_core::entry::MemoryEntry;

/// Build the prompt sent to a summarizer backend.
pub fn summary_prompt(owner: &str, batch: &[MemoryEntry], max_chars: usize) -> String {
    let lines = batch
        .iter()
        .map(MemoryEntry::render_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are maintaining the memory of the character {owner}.\n\
        Summarize the following conversation excerpt in at most {max_chars} characters.\n\
        Keep names, promises, facts and emotional turns. Write in third person.\n\n\
        Excerpt:\n{lines}\n\nSummary:"
    )
}

/// Concatenate the batch and clip it to `max_chars` characters.
pub fn truncate_summary(batch: &[MemoryEntry], max_chars: usize) -> String {
    let joined = batch
        .iter()
        .map(MemoryEntry::render_line)
        .collect::<Vec<_>>()
        .join(" | ");
    clip(&format!("Earlier ({} entries): {joined}", batch.len()), max_chars)
}

/// Clip `text` to at most `max_chars` characters, marking the cut with `…`.
pub fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token.
//! Good enough for sizing context windows; no tokenizer is loaded.

use crate::entry::MemoryEntry;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Estimate tokens for a single entry including per-entry overhead.
///
/// Each entry costs ~4 tokens of overhead for the speaker label and
/// line formatting in the rendered prompt.
pub fn estimate_entry_tokens(entry: &MemoryEntry) -> usize {
    let overhead = 4;
    overhead + estimate_tokens(&entry.content)
}

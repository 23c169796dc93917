//! Memory system for Roleplay characters.
//!
//! Each agent owns one [`Memory`]: an append-only, capacity-bounded record of
//! what the character heard and said. When it fills up, the oldest batch is
//! collapsed into a single summary entry.

pub mod bounded;
pub mod summary;

pub use bounded::{AppendReport, Memory, MemoryPolicy, MemoryStats, SUMMARY_SPEAKER};

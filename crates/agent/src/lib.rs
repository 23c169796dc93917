//! Roleplay characters.
//!
//! An [`Agent`] is one character in a scene. It turns what it can see
//! (its personality, its own memory, a window of the shared transcript and
//! the scene description) into a single prompt, asks its backend for a
//! line of dialogue, and remembers what it said:
//!
//! 1. **Observe** entries spoken by others (written to private memory)
//! 2. **Build prompt** with the pure [`prompt::build_prompt`]
//! 3. **Generate** via the configured backend, bounded by a timeout
//! 4. **Remember** the utterance and hand it back to the environment

pub mod agent;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use agent::{Agent, TurnContext, Utterance};
pub use prompt::build_prompt;

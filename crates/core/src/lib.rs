//! # Roleplay Core
//!
//! Domain types, traits, and error definitions for the Roleplay dialogue
//! engine. Every other crate depends inward on this one.
//!
//! ## Design Philosophy
//!
//! Capabilities the engine consumes (text generation, summarization) are
//! traits here; implementations live elsewhere. This enables:
//! - Swapping backends via configuration
//! - Deterministic testing with scripted backends
//! - Clean dependency graph

pub mod backend;
pub mod entry;
pub mod error;
pub mod event;
pub mod personality;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use backend::{Backend, GenerateOptions};
pub use entry::{EntryKind, MemoryEntry, Window, WindowBound};
pub use error::{
    AgentError, BackendError, BackendErrorKind, Error, MemoryError, Result, StateError,
};
pub use event::{DomainEvent, EventBus};
pub use personality::{Personality, RenderMode};

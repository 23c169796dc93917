//! Error types for the Roleplay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` wraps them all.

use thiserror::Error;

/// The top-level error type for all Roleplay operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Backend errors ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Agent errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Session state errors ---
    #[error("State error: {0}")]
    State(#[from] StateError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Personality validation ---
    #[error("Invalid personality: {0}")]
    InvalidPersonality(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failure of a single `Backend::generate` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited by backend{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(", retry after {secs}s"),
        None => String::new(),
    }
}

/// Discriminant of a [`BackendError`], used by retry and failure policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    Timeout,
    RateLimited,
    InvalidResponse,
    ProviderError,
}

impl BackendError {
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            Self::Timeout(_) => BackendErrorKind::Timeout,
            Self::RateLimited { .. } => BackendErrorKind::RateLimited,
            Self::InvalidResponse(_) => BackendErrorKind::InvalidResponse,
            Self::Provider(_) => BackendErrorKind::ProviderError,
        }
    }

    /// Only transient failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            BackendErrorKind::Timeout | BackendErrorKind::RateLimited
        )
    }

    /// Server-suggested wait before the next attempt, if any.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }
}

/// An agent could not produce an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("agent '{agent}' failed to respond: {cause}")]
pub struct AgentError {
    pub agent: String,
    #[source]
    pub cause: BackendError,
}

impl AgentError {
    pub fn new(agent: impl Into<String>, cause: BackendError) -> Self {
        Self {
            agent: agent.into(),
            cause,
        }
    }
}

/// An operation was invalid for the current session state.
///
/// These are programming errors on the caller's side and are always
/// surfaced immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("an agent named '{0}' is already registered")]
    DuplicateAgent(String),

    #[error("scene is full ({max} characters)")]
    SceneFull { max: usize },

    #[error("no agents registered")]
    NoAgents,

    #[error("turn sequence references unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("explicit turn sequence is empty")]
    EmptySequence,
}

/// Degraded-mode conditions on the memory eviction path.
///
/// Never fatal: the memory falls back to truncation and keeps its bound.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("summarization failed, fell back to truncation: {0}")]
    SummarizationFailed(String),

    #[error("summarization timed out after {timeout_ms}ms, fell back to truncation")]
    SummarizationTimedOut { timeout_ms: u64 },

    #[error("invalid memory policy: {0}")]
    InvalidPolicy(String),
}

//! Session lifecycle, run options and results.

use std::sync::Arc;
use std::time::Duration;

use roleplay_core::entry::WindowBound;
use roleplay_core::error::AgentError;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::retry::RetryPolicy;
use crate::schedule::TurnOrderPolicy;
use crate::transcript::Transcript;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Completed,
    Aborted,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a turn whose retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    Skip,
    Abort,
}

/// Decides per failure whether the session carries on.
pub trait FailureHandler: Send + Sync {
    fn on_failure(&self, error: &AgentError, round: u32) -> FailureAction;
}

#[derive(Clone, Default)]
pub enum FailurePolicy {
    #[default]
    SkipOnFailure,
    AbortOnFailure,
    Custom(Arc<dyn FailureHandler>),
}

impl std::fmt::Debug for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SkipOnFailure => f.write_str("SkipOnFailure"),
            Self::AbortOnFailure => f.write_str("AbortOnFailure"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FailurePolicy {
    pub fn decide(&self, error: &AgentError, round: u32) -> FailureAction {
        match self {
            Self::SkipOnFailure => FailureAction::Skip,
            Self::AbortOnFailure => FailureAction::Abort,
            Self::Custom(handler) => handler.on_failure(error, round),
        }
    }
}

/// Checked after every append; `true` completes the session.
pub type StopPredicate = Box<dyn Fn(&Transcript) -> bool + Send + Sync>;

/// Stop once the latest entry mentions `keyword` (case-insensitive).
pub fn stop_on_keyword(keyword: impl Into<String>) -> StopPredicate {
    let keyword = keyword.into().to_lowercase();
    Box::new(move |transcript: &Transcript| {
        !keyword.is_empty()
            && transcript
                .last()
                .is_some_and(|e| e.content.to_lowercase().contains(&keyword))
    })
}

/// Everything a single `run` needs.
pub struct RunOptions {
    pub max_rounds: u32,
    pub turn_order: TurnOrderPolicy,
    pub failure_policy: FailurePolicy,
    pub retry: RetryPolicy,
    /// Upper bound on each backend call
    pub backend_timeout: Option<Duration>,
    /// How much of the transcript each speaker sees
    pub context_window: WindowBound,
    pub stop_when: Option<StopPredicate>,
    pub cancellation: CancellationToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            turn_order: TurnOrderPolicy::default(),
            failure_policy: FailurePolicy::default(),
            retry: RetryPolicy::default(),
            backend_timeout: Some(Duration::from_secs(30)),
            context_window: WindowBound::default(),
            stop_when: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl RunOptions {
    pub fn new(max_rounds: u32) -> Self {
        Self {
            max_rounds,
            ..Self::default()
        }
    }

    pub fn with_turn_order(mut self, turn_order: TurnOrderPolicy) -> Self {
        self.turn_order = turn_order;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn with_context_window(mut self, bound: WindowBound) -> Self {
        self.context_window = bound;
        self
    }

    pub fn with_stop_when(mut self, predicate: StopPredicate) -> Self {
        self.stop_when = Some(predicate);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

/// Why a session ended `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The cancellation token fired
    Cancelled,
    /// A turn failed and the failure policy chose to abort
    TurnFailed(AgentError),
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::TurnFailed(err) => write!(f, "{err}"),
        }
    }
}

/// Outcome of one `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub session_id: String,
    pub state: SessionState,
    /// Turns taken, skipped ones included
    pub rounds_completed: u32,
    pub turns_skipped: u32,
    /// Memory compactions that fell back to truncation
    pub degraded_events: u32,
    /// Most recent unrecovered turn failure, skipped ones included
    pub last_error: Option<AgentError>,
    /// Set exactly when `state` is `Aborted`
    pub abort_reason: Option<AbortReason>,
}

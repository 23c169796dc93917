//! Scene orchestration for Roleplay.
//!
//! A [`ChatEnvironment`] owns the cast, the shared [`Transcript`] and the
//! turn-taking loop. Each turn it picks a speaker, shows them a window of
//! the transcript, records what they say and lets everyone else observe it.
//!
//! Session lifecycle: `Idle → Running → {Completed, Aborted}`. A terminal
//! session can be [`reset`](ChatEnvironment::reset) back to `Idle`, keeping
//! the cast and their memories.

pub mod environment;
pub mod retry;
pub mod scene;
pub mod schedule;
pub mod session;
pub mod transcript;

pub use environment::ChatEnvironment;
pub use retry::RetryPolicy;
pub use scene::SceneConfig;
pub use schedule::{TurnOrderPolicy, TurnSelector};
pub use session::{
    AbortReason, FailureAction, FailureHandler, FailurePolicy, RunOptions, SessionResult,
    SessionState, StopPredicate, stop_on_keyword,
};
pub use transcript::{ExportedEntry, Transcript};

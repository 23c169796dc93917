//! The chat environment — cast, transcript and the turn-taking loop.
//!
//! # Turn
//!
//! ```text
//!  select speaker ──► transcript window ──► speaker.respond(ctx)
//!                                               │
//!                     ┌─────────────────────────┴──────────┐
//!                     ▼ ok                                 ▼ err
//!          append to transcript                 retryable & attempts left?
//!          others.observe(entry)                  yes: back off, try again
//!          round += 1, check stop                 no:  failure policy
//!                                                      (skip: round += 1)
//! ```
//!
//! Exactly one `respond` is in flight per environment. Separate environments
//! share nothing mutable and may run concurrently.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use roleplay_agent::{Agent, TurnContext};
use roleplay_core::entry::{MemoryEntry, WindowBound};
use roleplay_core::error::{AgentError, MemoryError, StateError};
use roleplay_core::event::{DomainEvent, EventBus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::retry::RetryPolicy;
use crate::scene::SceneConfig;
use crate::session::{AbortReason, FailureAction, RunOptions, SessionResult, SessionState};
use crate::transcript::Transcript;

/// Owns the agents of one scene and drives their conversation.
pub struct ChatEnvironment {
    scene: SceneConfig,
    agents: Vec<Agent>,
    transcript: Transcript,
    state: SessionState,
    rounds_completed: u32,
    last_error: Option<AgentError>,
    event_bus: Option<Arc<EventBus>>,
}

/// How a single turn ended.
enum TurnOutcome {
    Spoke,
    Failed(AgentError),
    Cancelled,
}

/// Per-run settings every turn reads.
struct TurnSettings<'a> {
    session_id: &'a str,
    scene: Option<&'a str>,
    retry: &'a RetryPolicy,
    backend_timeout: Option<Duration>,
    context_window: WindowBound,
    cancellation: &'a CancellationToken,
}

/// Per-run tallies that end up in the [`SessionResult`].
#[derive(Default)]
struct RunTally {
    skipped: u32,
    degraded: u32,
}

impl ChatEnvironment {
    /// Create an empty environment in `Idle`.
    pub fn new(scene: SceneConfig) -> Self {
        Self {
            scene,
            agents: Vec::new(),
            transcript: Transcript::new(),
            state: SessionState::Idle,
            rounds_completed: 0,
            last_error: None,
            event_bus: None,
        }
    }

    /// Publish session events to `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Add an agent to the cast. Only valid while `Idle`.
    pub fn register(&mut self, agent: Agent) -> Result<(), StateError> {
        self.require_idle("register")?;
        if self.agents.iter().any(|a| a.name() == agent.name()) {
            return Err(StateError::DuplicateAgent(agent.name().to_string()));
        }
        if self.agents.len() >= self.scene.max_characters {
            return Err(StateError::SceneFull {
                max: self.scene.max_characters,
            });
        }

        debug!(agent = %agent.name(), backend = %agent.backend().name(), "Agent registered");
        self.agents.push(agent);
        Ok(())
    }

    /// Narrate a system entry into the transcript and every agent's memory.
    ///
    /// Only valid while `Idle`; returns the entry's sequence id.
    pub async fn announce(&mut self, content: impl Into<String>) -> Result<u64, StateError> {
        self.require_idle("announce")?;
        let entry = MemoryEntry::system(content);
        let sequence_id = self.transcript.append(entry.clone());
        for agent in &mut self.agents {
            if let Some(err) = agent.observe(entry.clone()).await {
                warn!(agent = %agent.name(), error = %err, "Memory degraded while announcing");
            }
        }
        Ok(sequence_id)
    }

    /// Drive a session until it completes, aborts or is cancelled.
    ///
    /// Turn failures never escape: they are retried, skipped or end the
    /// session per `options`, and show up in the returned result. Only
    /// misuse (wrong state, empty cast, bad turn sequence) is an error.
    pub async fn run(&mut self, options: RunOptions) -> Result<SessionResult, StateError> {
        self.require_idle("run")?;
        if self.agents.is_empty() {
            return Err(StateError::NoAgents);
        }

        let RunOptions {
            max_rounds,
            turn_order,
            failure_policy,
            retry,
            backend_timeout,
            context_window,
            stop_when,
            cancellation,
        } = options;

        let names: Vec<String> = self.agents.iter().map(|a| a.name().to_string()).collect();
        let mut selector = turn_order.into_selector(&names)?;

        let session_id = Uuid::new_v4().to_string();
        let scene = self.scene.prompt_text();
        let settings = TurnSettings {
            session_id: &session_id,
            scene: scene.as_deref(),
            retry: &retry,
            backend_timeout,
            context_window,
            cancellation: &cancellation,
        };

        self.state = SessionState::Running;
        info!(session_id = %session_id, agents = names.len(), max_rounds, "Session started");
        self.publish(DomainEvent::SessionStarted {
            session_id: session_id.clone(),
            agents: names.clone(),
            max_rounds,
            timestamp: Utc::now(),
        });

        let mut tally = RunTally::default();
        let mut previous = None;

        // `None` completes the session, `Some` aborts it
        let abort_reason = loop {
            if self.rounds_completed >= max_rounds {
                break None;
            }
            if cancellation.is_cancelled() {
                info!(session_id = %session_id, "Session cancelled");
                break Some(AbortReason::Cancelled);
            }

            let round = self.rounds_completed + 1;
            let speaker = selector.next_speaker(&names, previous) % names.len();
            previous = Some(speaker);

            match self.take_turn(speaker, round, &settings, &mut tally).await {
                TurnOutcome::Spoke => {
                    self.rounds_completed = round;
                    if stop_when.as_ref().is_some_and(|stop| stop(&self.transcript)) {
                        info!(session_id = %session_id, round, "Stop condition met");
                        break None;
                    }
                }
                TurnOutcome::Failed(err) => {
                    let action = failure_policy.decide(&err, round);
                    self.last_error = Some(err.clone());
                    match action {
                        FailureAction::Skip => {
                            warn!(
                                session_id = %session_id,
                                speaker = %names[speaker],
                                round,
                                "Turn skipped"
                            );
                            self.publish(DomainEvent::TurnSkipped {
                                session_id: session_id.clone(),
                                round,
                                speaker: names[speaker].clone(),
                                timestamp: Utc::now(),
                            });
                            tally.skipped += 1;
                            self.rounds_completed = round;
                        }
                        FailureAction::Abort => {
                            warn!(
                                session_id = %session_id,
                                speaker = %names[speaker],
                                round,
                                "Turn failed, aborting session"
                            );
                            break Some(AbortReason::TurnFailed(err));
                        }
                    }
                }
                TurnOutcome::Cancelled => {
                    info!(session_id = %session_id, round, "Session cancelled mid-turn");
                    break Some(AbortReason::Cancelled);
                }
            }
        };

        let final_state = match abort_reason {
            None => SessionState::Completed,
            Some(_) => SessionState::Aborted,
        };

        self.state = final_state;
        info!(
            session_id = %session_id,
            state = %final_state,
            rounds = self.rounds_completed,
            skipped = tally.skipped,
            degraded = tally.degraded,
            "Session finished"
        );
        self.publish(DomainEvent::SessionFinished {
            session_id: session_id.clone(),
            state: final_state.to_string(),
            rounds_completed: self.rounds_completed,
            timestamp: Utc::now(),
        });

        Ok(SessionResult {
            session_id,
            state: final_state,
            rounds_completed: self.rounds_completed,
            turns_skipped: tally.skipped,
            degraded_events: tally.degraded,
            last_error: self.last_error.clone(),
            abort_reason,
        })
    }

    /// One turn for `self.agents[speaker]`, including retries.
    async fn take_turn(
        &mut self,
        speaker: usize,
        round: u32,
        settings: &TurnSettings<'_>,
        tally: &mut RunTally,
    ) -> TurnOutcome {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let result = {
                let mut ctx = TurnContext::new(self.transcript.window(settings.context_window))
                    .with_round(round);
                ctx.scene = settings.scene;
                ctx.timeout = settings.backend_timeout;

                let agent = &mut self.agents[speaker];
                debug!(
                    speaker = %agent.name(),
                    round,
                    attempt,
                    window = ctx.transcript.len(),
                    "Turn started"
                );

                tokio::select! {
                    biased;
                    _ = settings.cancellation.cancelled() => return TurnOutcome::Cancelled,
                    result = agent.respond(&ctx) => result,
                }
            };

            let err = match result {
                Ok(utterance) => {
                    if let Some(degraded) = utterance.degraded {
                        self.record_degraded(settings.session_id, speaker, &degraded, tally);
                    }
                    self.commit(speaker, round, utterance.entry, settings, tally).await;
                    return TurnOutcome::Spoke;
                }
                Err(err) => err,
            };

            warn!(
                session_id = %settings.session_id,
                speaker = %err.agent,
                round,
                attempt,
                error = %err.cause,
                "Turn attempt failed"
            );
            self.publish(DomainEvent::TurnFailed {
                session_id: settings.session_id.to_string(),
                round,
                speaker: err.agent.clone(),
                attempt,
                error_message: err.cause.to_string(),
                timestamp: Utc::now(),
            });

            if !err.cause.is_retryable() || attempt > settings.retry.max_retries {
                return TurnOutcome::Failed(err);
            }

            let delay = settings.retry.delay_for(attempt, err.cause.retry_after_secs());
            warn!(
                speaker = %err.agent,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying turn"
            );
            self.publish(DomainEvent::RetryScheduled {
                session_id: settings.session_id.to_string(),
                speaker: err.agent.clone(),
                attempt,
                delay_ms: delay.as_millis() as u64,
                timestamp: Utc::now(),
            });

            tokio::select! {
                biased;
                _ = settings.cancellation.cancelled() => return TurnOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Append a successful utterance and let everyone else observe it.
    async fn commit(
        &mut self,
        speaker: usize,
        round: u32,
        entry: MemoryEntry,
        settings: &TurnSettings<'_>,
        tally: &mut RunTally,
    ) {
        let sequence_id = self.transcript.append(entry);
        let Some(recorded) = self.transcript.last().cloned() else {
            return;
        };

        debug!(speaker = %recorded.speaker, round, sequence_id, "Turn completed");
        self.publish(DomainEvent::TurnCompleted {
            session_id: settings.session_id.to_string(),
            round,
            sequence_id,
            speaker: recorded.speaker.clone(),
            timestamp: Utc::now(),
        });

        for index in 0..self.agents.len() {
            if index == speaker {
                continue;
            }
            if let Some(degraded) = self.agents[index].observe(recorded.clone()).await {
                self.record_degraded(settings.session_id, index, &degraded, tally);
            }
        }
    }

    fn record_degraded(
        &self,
        session_id: &str,
        agent: usize,
        error: &MemoryError,
        tally: &mut RunTally,
    ) {
        tally.degraded += 1;
        self.publish(DomainEvent::MemoryDegraded {
            session_id: session_id.to_string(),
            agent: self.agents[agent].name().to_string(),
            reason: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Clear the transcript and counters so the cast can play again.
    ///
    /// Agents and their memories are kept. Not allowed while `Running`.
    pub fn reset(&mut self) -> Result<(), StateError> {
        if self.state == SessionState::Running {
            return Err(StateError::InvalidState {
                operation: "reset",
                state: self.state.to_string(),
            });
        }
        self.transcript.clear();
        self.rounds_completed = 0;
        self.last_error = None;
        self.state = SessionState::Idle;
        debug!("Environment reset");
        Ok(())
    }

    /// Human-readable summary of the scene and its cast.
    pub fn describe_scene(&self) -> String {
        let mut out = String::new();
        if !self.scene.description.trim().is_empty() {
            out.push_str(&format!("Scene: {}\n", self.scene.description.trim()));
        }
        if !self.scene.background_story.trim().is_empty() {
            out.push_str(&format!("Background: {}\n", self.scene.background_story.trim()));
        }
        out.push_str(&format!(
            "Characters ({}/{}):\n",
            self.agents.len(),
            self.scene.max_characters
        ));
        for agent in &self.agents {
            out.push_str(&format!(
                "- {}\n",
                agent
                    .personality()
                    .render(roleplay_core::personality::RenderMode::Compact)
            ));
        }
        out.push_str(&format!("State: {}", self.state));
        out
    }

    fn require_idle(&self, operation: &'static str) -> Result<(), StateError> {
        if self.state != SessionState::Idle {
            return Err(StateError::InvalidState {
                operation,
                state: self.state.to_string(),
            });
        }
        Ok(())
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name() == name)
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn last_error(&self) -> Option<&AgentError> {
        self.last_error.as_ref()
    }

    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }
}

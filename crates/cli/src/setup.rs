//! Turns an `AppConfig` into a ready-to-run environment and run options.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use roleplay_agent::Agent;
use roleplay_config::{AppConfig, ConfigError, FailurePolicyKind, TurnOrderKind};
use roleplay_core::entry::WindowBound;
use roleplay_environment::{
    ChatEnvironment, FailurePolicy, RetryPolicy, RunOptions, SceneConfig, TurnOrderPolicy,
    stop_on_keyword,
};

/// Load from `path` if given, otherwise from the default location.
///
/// Environment overrides apply either way.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        None => AppConfig::load(),
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
            config.validate()?;
            Ok(config)
        }
    }
}

/// Build the environment with every configured character registered.
pub fn build_environment(config: &AppConfig) -> Result<ChatEnvironment, Box<dyn std::error::Error>> {
    if config.characters.is_empty() {
        return Err("No characters configured. Run `roleplay init` or add [[characters]] to the config.".into());
    }

    let scene = SceneConfig::new(&config.scene.description)
        .with_background_story(&config.scene.background_story)
        .with_max_characters(config.scene.max_characters);
    let mut env = ChatEnvironment::new(scene);

    for character in &config.characters {
        let personality = Arc::new(character.to_personality()?);
        let backend = roleplay_backends::build_from_config(config, personality.name());

        let mut agent = Agent::new(personality, backend.clone(), config.memory.to_policy())?
            .with_options(config.generation.to_options())
            .with_memory_window(WindowBound::Entries(config.memory.window_entries));
        if config.memory.summarize_with_backend {
            agent = agent.with_summarizer(backend);
        }

        env.register(agent)?;
    }

    Ok(env)
}

pub fn run_options(config: &AppConfig) -> RunOptions {
    let session = &config.session;

    let turn_order = match session.turn_order {
        TurnOrderKind::RoundRobin => TurnOrderPolicy::RoundRobin,
        TurnOrderKind::Random => TurnOrderPolicy::Random {
            seed: session.random_seed,
        },
        TurnOrderKind::Explicit => TurnOrderPolicy::ExplicitSequence(session.sequence.clone()),
    };

    let failure_policy = match session.failure_policy {
        FailurePolicyKind::SkipOnFailure => FailurePolicy::SkipOnFailure,
        FailurePolicyKind::AbortOnFailure => FailurePolicy::AbortOnFailure,
    };

    let retry = RetryPolicy::default()
        .with_max_retries(config.retry.max_retries)
        .with_initial_delay(Duration::from_millis(config.retry.initial_delay_ms))
        .with_max_delay(Duration::from_millis(config.retry.max_delay_ms))
        .with_multiplier(config.retry.multiplier);

    // 0 disables the per-call timeout
    let backend_timeout =
        (session.backend_timeout_secs > 0).then(|| Duration::from_secs(session.backend_timeout_secs));

    let mut options = RunOptions::new(session.max_rounds)
        .with_turn_order(turn_order)
        .with_failure_policy(failure_policy)
        .with_retry(retry)
        .with_backend_timeout(backend_timeout)
        .with_context_window(WindowBound::Entries(session.context_window));
    if let Some(keyword) = session.stop_keyword.as_deref().filter(|k| !k.trim().is_empty()) {
        options = options.with_stop_when(stop_on_keyword(keyword));
    }
    options
}

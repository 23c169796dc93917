//! `roleplay run` — Play a session and print the transcript.

use std::path::PathBuf;

use roleplay_environment::AbortReason;
use tracing::warn;

use crate::setup;

pub async fn run(
    config_path: Option<PathBuf>,
    rounds: Option<u32>,
    export: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = setup::load_config(config_path.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    let mut env = setup::build_environment(&config)?;
    let mut options = setup::run_options(&config);
    if let Some(rounds) = rounds {
        options.max_rounds = rounds;
    }

    // Ctrl+C ends the session after the in-flight turn is dropped
    let token = options.cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping session");
            token.cancel();
        }
    });

    println!();
    for line in env.describe_scene().lines() {
        println!("  {line}");
    }
    println!();

    let result = env.run(options).await?;

    for entry in env.transcript().entries() {
        println!("  [{}] {}: {}", entry.sequence_id, entry.speaker, entry.content);
    }

    println!();
    println!("  Session:   {}", result.session_id);
    println!("  State:     {}", result.state);
    println!("  Rounds:    {}", result.rounds_completed);
    if result.turns_skipped > 0 {
        println!("  Skipped:   {}", result.turns_skipped);
    }
    if result.degraded_events > 0 {
        println!("  Degraded:  {} memory compaction(s) fell back to truncation", result.degraded_events);
    }
    if let Some(err) = &result.last_error {
        println!("  Last error: {err}");
    }

    if let Some(path) = export {
        std::fs::write(&path, env.transcript().to_json()?)?;
        println!("\n  ✅ Transcript written to {}", path.display());
    }
    println!();

    match result.abort_reason {
        Some(AbortReason::Cancelled) => println!("  Session cancelled before completion."),
        Some(AbortReason::TurnFailed(err)) => return Err(format!("Session aborted: {err}").into()),
        None => {}
    }

    Ok(())
}

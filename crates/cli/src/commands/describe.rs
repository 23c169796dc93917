//! `roleplay describe` — Show the scene, cast and session settings.

use std::path::PathBuf;

use roleplay_config::AppConfig;

use crate::setup;

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = setup::load_config(config_path.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;
    let env = setup::build_environment(&config)?;

    println!("🎭 Roleplay Scene");
    println!("=================");
    for line in env.describe_scene().lines() {
        println!("  {line}");
    }
    println!();
    print_settings(&config);

    Ok(())
}

fn print_settings(config: &AppConfig) {
    let session = &config.session;
    println!("  Max rounds:    {}", session.max_rounds);
    println!("  Turn order:    {:?}", session.turn_order);
    if !session.sequence.is_empty() {
        println!("  Sequence:      {}", session.sequence.join(" → "));
    }
    println!("  On failure:    {:?}", session.failure_policy);
    if let Some(keyword) = &session.stop_keyword {
        println!("  Stop keyword:  {keyword}");
    }
    println!("  Backend:       {:?}", config.backend.kind);
    println!(
        "  Memory:        {} entries, compacting {} at a time{}",
        config.memory.capacity,
        config.memory.batch_size,
        if config.memory.summarize_with_backend { " (summarized)" } else { "" }
    );
    println!(
        "  Retries:       {} ({}ms → {}ms)",
        config.retry.max_retries, config.retry.initial_delay_ms, config.retry.max_delay_ms
    );
}

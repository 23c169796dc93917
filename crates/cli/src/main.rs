//! Roleplay CLI — the main entry point.
//!
//! Commands:
//! - `run`       — Play a session from the configured scene and cast
//! - `describe`  — Show the scene, cast and session settings
//! - `config`    — Show, locate or validate the configuration
//! - `init`      — Write a sample configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod setup;

#[derive(Parser)]
#[command(
    name = "roleplay",
    about = "Roleplay — multi-character dialogue sessions",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of ~/.roleplay/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a dialogue session
    Run {
        /// Override session.max_rounds
        #[arg(short, long)]
        rounds: Option<u32>,

        /// Write the transcript as JSON to this path
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Describe the scene and cast without running
    Describe,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Write a sample configuration
    Init,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Check the configuration for errors
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing on stderr; stdout carries the transcript
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config;
    match cli.command {
        Commands::Run { rounds, export } => commands::run::run(config, rounds, export).await?,
        Commands::Describe => commands::describe::run(config).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config).await?,
            ConfigAction::Path => commands::config_cmd::path(config).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config).await?,
        },
        Commands::Init => commands::init::run(config).await?,
    }

    Ok(())
}

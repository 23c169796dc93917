//! Configuration loading, validation, and management for Roleplay.
//!
//! Loads configuration from `~/.roleplay/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use roleplay_core::backend::GenerateOptions;
use roleplay_core::personality::Personality;
use roleplay_memory::MemoryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.roleplay/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sampling settings shared by every character
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Per-character memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Turn-taking and termination
    #[serde(default)]
    pub session: SessionConfig,

    /// Backoff for transient backend failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Scene the characters share
    #[serde(default)]
    pub scene: SceneConfig,

    /// Which offline backend generates lines
    #[serde(default)]
    pub backend: BackendConfig,

    /// Cast of characters, in registration order
    #[serde(default)]
    pub characters: Vec<CharacterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    512
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            stop_sequences: vec![],
        }
    }
}

impl GenerationConfig {
    pub fn to_options(&self) -> GenerateOptions {
        self.stop_sequences.iter().fold(
            GenerateOptions::default()
                .with_temperature(self.temperature)
                .with_max_tokens(self.max_tokens),
            |opts, stop| opts.with_stop(stop.clone()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Summarize evicted memory with the character's own backend
    #[serde(default)]
    pub summarize_with_backend: bool,

    #[serde(default = "default_summarize_timeout_secs")]
    pub summarize_timeout_secs: u64,

    /// How many memory entries go into each prompt
    #[serde(default = "default_window_entries")]
    pub window_entries: usize,
}

fn default_capacity() -> usize {
    50
}
fn default_batch_size() -> usize {
    10
}
fn default_summary_max_chars() -> usize {
    600
}
fn default_summarize_timeout_secs() -> u64 {
    20
}
fn default_window_entries() -> usize {
    20
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            batch_size: default_batch_size(),
            summary_max_chars: default_summary_max_chars(),
            summarize_with_backend: false,
            summarize_timeout_secs: default_summarize_timeout_secs(),
            window_entries: default_window_entries(),
        }
    }
}

impl MemoryConfig {
    /// The runtime policy each agent's memory is built with.
    pub fn to_policy(&self) -> MemoryPolicy {
        MemoryPolicy::new(self.capacity, self.batch_size)
            .with_summary_max_chars(self.summary_max_chars)
            .with_summarize_timeout(Duration::from_secs(self.summarize_timeout_secs))
    }
}

/// How the next speaker is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrderKind {
    #[default]
    RoundRobin,
    Random,
    Explicit,
}

impl FromStr for TurnOrderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "round_robin" => Ok(Self::RoundRobin),
            "random" => Ok(Self::Random),
            "explicit" => Ok(Self::Explicit),
            other => Err(ConfigError::ValidationError(format!(
                "unknown turn order '{other}' (expected round_robin, random or explicit)"
            ))),
        }
    }
}

/// What happens when a turn fails after all retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicyKind {
    #[default]
    SkipOnFailure,
    AbortOnFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    #[serde(default)]
    pub turn_order: TurnOrderKind,

    /// Speaker names for the explicit turn order, cycled
    #[serde(default)]
    pub sequence: Vec<String>,

    #[serde(default)]
    pub failure_policy: FailurePolicyKind,

    /// End the session once an utterance contains this text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_keyword: Option<String>,

    /// How many transcript entries each speaker sees
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,

    /// Seed for the random turn order (unseeded when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

fn default_max_rounds() -> u32 {
    10
}
fn default_context_window() -> usize {
    12
}
fn default_backend_timeout_secs() -> u64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            turn_order: TurnOrderKind::default(),
            sequence: vec![],
            failure_policy: FailurePolicyKind::default(),
            stop_keyword: None,
            context_window: default_context_window(),
            backend_timeout_secs: default_backend_timeout_secs(),
            random_seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_retries() -> u32 {
    2
}
fn default_initial_delay_ms() -> u64 {
    250
}
fn default_max_delay_ms() -> u64 {
    4000
}
fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub background_story: String,

    #[serde(default = "default_max_characters")]
    pub max_characters: usize,
}

fn default_max_characters() -> usize {
    10
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            background_story: String::new(),
            max_characters: default_max_characters(),
        }
    }
}

/// Offline backend flavours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Template,
    Scripted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Reply template; `{name}` and `{call}` are substituted
    #[serde(default = "default_template")]
    pub template: String,

    /// Lines replayed by the scripted backend, in order
    #[serde(default)]
    pub lines: Vec<String>,

    /// Replay the script from the start once it runs out
    #[serde(default)]
    pub cycle: bool,
}

fn default_template() -> String {
    "{name} takes turn {call} and weighs what was just said.".into()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            template: default_template(),
            lines: vec![],
            cycle: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub name: String,

    #[serde(default)]
    pub traits: Vec<String>,

    #[serde(default)]
    pub style: String,

    #[serde(default)]
    pub background: String,

    /// Scripted lines for this character, overriding `backend.lines`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
}

impl CharacterConfig {
    pub fn to_personality(&self) -> roleplay_core::Result<Personality> {
        Ok(Personality::new(&self.name, self.traits.iter().cloned(), &self.style)?
            .with_background(&self.background))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.roleplay/config.toml).
    ///
    /// Environment overrides:
    /// - `ROLEPLAY_MAX_ROUNDS`
    /// - `ROLEPLAY_TURN_ORDER`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides read through `lookup` (the process environment in `load`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rounds) = lookup("ROLEPLAY_MAX_ROUNDS") {
            self.session.max_rounds = rounds.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "ROLEPLAY_MAX_ROUNDS must be a non-negative integer, got '{rounds}'"
                ))
            })?;
        }

        if let Some(order) = lookup("ROLEPLAY_TURN_ORDER") {
            self.session.turn_order = order.parse()?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".roleplay")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.generation.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        self.memory
            .to_policy()
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("[memory] {e}")))?;

        if self.session.turn_order == TurnOrderKind::Explicit && self.session.sequence.is_empty() {
            return Err(ConfigError::ValidationError(
                "session.sequence is required when turn_order = \"explicit\"".into(),
            ));
        }

        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.multiplier must be at least 1.0".into(),
            ));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry.initial_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }

        if self.characters.len() > self.scene.max_characters {
            return Err(ConfigError::ValidationError(format!(
                "{} characters configured but the scene allows {}",
                self.characters.len(),
                self.scene.max_characters
            )));
        }

        let mut seen = HashSet::new();
        for character in &self.characters {
            let name = character.name.trim();
            if name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "character names must not be empty".into(),
                ));
            }
            if !seen.insert(name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate character name '{name}'"
                )));
            }
        }

        Ok(())
    }

    /// Look up a configured character by name.
    /// Look up a configured character by name, ignoring surrounding whitespace.
    pub fn character(&self, name: &str) -> Option<&CharacterConfig> {
        let name = name.trim();
        self.characters.iter().find(|c| c.name.trim() == name)
    }

    /// A small ready-to-run configuration (for the `init` command).
    pub fn sample() -> Self {
        Self {
            scene: SceneConfig {
                description: "A lantern-lit tavern on the edge of a harbour town.".into(),
                background_story: "A storm has closed the port; strangers share a table.".into(),
                ..SceneConfig::default()
            },
            characters: vec![
                CharacterConfig {
                    name: "Mira".into(),
                    traits: vec!["curious".into(), "quick-witted".into()],
                    style: "Asks pointed questions in short sentences.".into(),
                    background: "A cartographer stranded on her way north.".into(),
                    lines: vec![],
                },
                CharacterConfig {
                    name: "Tobin".into(),
                    traits: vec!["gruff".into(), "loyal".into()],
                    style: "Answers plainly, with sailor's slang.".into(),
                    background: "The harbour master, tired of the weather.".into(),
                    lines: vec![],
                },
            ],
            ..Self::default()
        }
    }

    /// Generate a sample config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::sample()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.session.max_rounds, 10);
        assert_eq!(config.memory.capacity, 50);
        assert_eq!(config.memory.batch_size, 10);
        assert_eq!(config.retry.max_retries, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::sample();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.characters.len(), 2);
        assert_eq!(parsed.characters[0].name, "Mira");
        assert_eq!(parsed.session.turn_order, TurnOrderKind::RoundRobin);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.generation.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn memory_bounds_enforced() {
        let mut config = AppConfig::default();
        config.memory.batch_size = 1;
        assert!(config.validate().is_err());

        config.memory.batch_size = 60;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn memory_validation_agrees_with_runtime_policy() {
        for capacity in 0..6 {
            for batch_size in 0..8 {
                let mut config = AppConfig::default();
                config.memory.capacity = capacity;
                config.memory.batch_size = batch_size;
                assert_eq!(
                    config.validate().is_ok(),
                    config.memory.to_policy().validate().is_ok(),
                    "capacity {capacity}, batch_size {batch_size}"
                );
            }
        }

        let mut config = AppConfig::default();
        config.memory.summary_max_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn memory_config_maps_to_policy() {
        let mut config = AppConfig::default();
        config.memory.capacity = 8;
        config.memory.batch_size = 3;
        config.memory.summarize_timeout_secs = 4;

        let policy = config.memory.to_policy();
        assert_eq!(policy.capacity, 8);
        assert_eq!(policy.batch_size, 3);
        assert_eq!(policy.summary_max_chars, config.memory.summary_max_chars);
        assert_eq!(policy.summarize_timeout, Duration::from_secs(4));
    }

    #[test]
    fn explicit_order_requires_sequence() {
        let mut config = AppConfig::default();
        config.session.turn_order = TurnOrderKind::Explicit;
        assert!(config.validate().is_err());

        config.session.sequence = vec!["Mira".into()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duplicate_characters_rejected() {
        let mut config = AppConfig::sample();
        config.characters[1].name = "Mira".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate character name 'Mira'"));
    }

    #[test]
    fn shrinking_multiplier_rejected() {
        let mut config = AppConfig::default();
        config.retry.multiplier = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert!(result.unwrap().characters.is_empty());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[session]
max_rounds = 4
turn_order = "explicit"
sequence = ["Ada", "Ben", "Ada"]
failure_policy = "abort_on_failure"
stop_keyword = "farewell"

[backend]
kind = "scripted"
lines = ["One.", "Two."]

[[characters]]
name = "Ada"
traits = ["precise"]
style = "Formal."

[[characters]]
name = "Ben"
traits = ["easygoing"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.session.max_rounds, 4);
        assert_eq!(config.session.turn_order, TurnOrderKind::Explicit);
        assert_eq!(config.session.failure_policy, FailurePolicyKind::AbortOnFailure);
        assert_eq!(config.session.stop_keyword.as_deref(), Some("farewell"));
        assert_eq!(config.backend.kind, BackendKind::Scripted);
        assert_eq!(config.characters.len(), 2);
        assert_eq!(config.character("Ben").unwrap().traits, vec!["easygoing"]);
        // untouched sections keep their defaults
        assert_eq!(config.memory.capacity, 50);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[session\nmax_rounds = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ROLEPLAY_MAX_ROUNDS", "3"),
            ("ROLEPLAY_TURN_ORDER", "random"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.session.max_rounds, 3);
        assert_eq!(config.session.turn_order, TurnOrderKind::Random);
    }

    #[test]
    fn bad_env_override_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "ROLEPLAY_MAX_ROUNDS").then(|| "lots".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn turn_order_parses_loosely() {
        assert_eq!("Round-Robin".parse::<TurnOrderKind>().unwrap(), TurnOrderKind::RoundRobin);
        assert!("shuffle".parse::<TurnOrderKind>().is_err());
    }

    #[test]
    fn generation_config_becomes_options() {
        let generation = GenerationConfig {
            temperature: 1.1,
            max_tokens: 64,
            stop_sequences: vec!["\n\n".into()],
        };
        let options = generation.to_options();
        assert!((options.temperature - 1.1).abs() < f32::EPSILON);
        assert_eq!(options.max_tokens, Some(64));
        assert!(options.stop_sequences.contains("\n\n"));
    }

    #[test]
    fn character_becomes_personality() {
        let sample = AppConfig::sample();
        let personality = sample.characters[0].to_personality().unwrap();
        assert_eq!(personality.name(), "Mira");
        assert_eq!(personality.traits().len(), 2);

        let no_traits = CharacterConfig {
            name: "Nobody".into(),
            traits: vec![],
            style: String::new(),
            background: String::new(),
            lines: vec![],
        };
        assert!(no_traits.to_personality().is_err());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[[characters]]"));
        assert!(toml_str.contains("Mira"));
        assert!(toml_str.contains("round_robin"));
    }
}

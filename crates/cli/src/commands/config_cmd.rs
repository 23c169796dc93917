//! `roleplay config` — Configuration management commands.

use std::path::PathBuf;

use roleplay_config::AppConfig;

use crate::setup;

pub async fn validate(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match setup::load_config(config_path.as_deref()) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Characters: {}", config.characters.len());
            println!("   Backend:    {:?}", config.backend.kind);
            println!("   Rounds:     {}", config.session.max_rounds);
            println!("   Turn order: {:?}", config.session.turn_order);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Problems that are legal but probably not what the user wants.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.characters.len() < 2 {
        warnings.push("Fewer than two characters; the scene will be a monologue".to_string());
    }

    for name in &config.session.sequence {
        if config.character(name).is_none() {
            warnings.push(format!("session.sequence names unknown character '{name}'"));
        }
    }

    for character in &config.characters {
        if let Err(e) = character.to_personality() {
            warnings.push(e.to_string());
        }
    }

    if config.session.max_rounds == 0 {
        warnings.push("session.max_rounds is 0; nothing will be said".to_string());
    }

    warnings
}

pub async fn show(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = setup::load_config(config_path.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.unwrap_or_else(AppConfig::config_path);
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_path();
        assert!(path.to_str().unwrap().contains("config.toml"));
    }

    #[test]
    fn sample_has_no_warnings() {
        assert!(warnings(&AppConfig::sample()).is_empty());
    }

    #[test]
    fn unknown_sequence_name_warns() {
        let mut config = AppConfig::sample();
        config.session.sequence = vec!["Mira".into(), "Nobody".into()];
        let warnings = warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Nobody"));
    }
}

//! Backend selection from configuration.

use std::sync::Arc;
use std::time::Duration;

use roleplay_config::{AppConfig, BackendKind};
use roleplay_core::backend::Backend;

use crate::fallback::FallbackBackend;
use crate::scripted::ScriptedBackend;
use crate::template::TemplateBackend;

/// Build the backend that speaks for `speaker`.
///
/// `template` gives every character a [`TemplateBackend`]. `scripted` replays
/// the character's own `lines` (or the shared `backend.lines`), and once a
/// non-cycling script runs out the template takes over.
pub fn build_from_config(config: &AppConfig, speaker: &str) -> Arc<dyn Backend> {
    let template: Arc<dyn Backend> =
        Arc::new(TemplateBackend::new(speaker, &config.backend.template));

    match config.backend.kind {
        BackendKind::Template => template,
        BackendKind::Scripted => {
            let lines = config
                .character(speaker)
                .map(|c| c.lines.clone())
                .filter(|lines| !lines.is_empty())
                .unwrap_or_else(|| config.backend.lines.clone());

            let mut scripted = ScriptedBackend::replies(lines);
            if config.backend.cycle {
                scripted = scripted.cycling();
            }

            let timeout = Duration::from_secs(config.session.backend_timeout_secs.max(1));
            Arc::new(
                FallbackBackend::new(format!("scripted:{speaker}"))
                    .add(Arc::new(scripted), timeout)
                    .add(template, timeout),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roleplay_config::CharacterConfig;
    use roleplay_core::backend::GenerateOptions;

    fn character(name: &str, lines: &[&str]) -> CharacterConfig {
        CharacterConfig {
            name: name.into(),
            traits: vec!["steady".into()],
            style: String::new(),
            background: String::new(),
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn build_from_default_config_uses_template() {
        let config = AppConfig::default();
        let backend = build_from_config(&config, "Mira");
        assert_eq!(backend.name(), "template");
        let text = backend.generate("", &GenerateOptions::default()).await.unwrap();
        assert!(text.starts_with("Mira takes turn 1"));
    }

    #[tokio::test]
    async fn scripted_prefers_character_lines_then_template() {
        let mut config = AppConfig::default();
        config.backend.kind = BackendKind::Scripted;
        config.backend.template = "{name} is out of lines".into();
        config.backend.lines = vec!["shared".into()];
        config.characters = vec![character("Ada", &["mine"]), character("Ben", &[])];

        let opts = GenerateOptions::default();
        let ada = build_from_config(&config, "Ada");
        assert_eq!(ada.generate("", &opts).await.unwrap(), "mine");
        assert_eq!(ada.generate("", &opts).await.unwrap(), "Ada is out of lines");

        let ben = build_from_config(&config, "Ben");
        assert_eq!(ben.generate("", &opts).await.unwrap(), "shared");
    }

    #[tokio::test]
    async fn padded_character_name_still_finds_its_lines() {
        let mut config = AppConfig::default();
        config.backend.kind = BackendKind::Scripted;
        config.backend.template = "[{name}]".into();
        config.characters = vec![character(" Ada ", &["mine"])];

        let opts = GenerateOptions::default();
        let ada = build_from_config(&config, "Ada");
        assert_eq!(ada.generate("", &opts).await.unwrap(), "mine");
        assert_eq!(ada.generate("", &opts).await.unwrap(), "[Ada]");
    }

    #[tokio::test]
    async fn cycling_script_never_reaches_template() {
        let mut config = AppConfig::default();
        config.backend.kind = BackendKind::Scripted;
        config.backend.cycle = true;
        config.backend.lines = vec!["x".into(), "y".into()];

        let backend = build_from_config(&config, "Ada");
        let opts = GenerateOptions::default();
        let mut out = Vec::new();
        for _ in 0..3 {
            out.push(backend.generate("", &opts).await.unwrap());
        }
        assert_eq!(out, vec!["x", "y", "x"]);
    }
}

//! The scene a session plays out in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Where and when, shown to every speaker
    pub description: String,

    /// What happened before the session starts
    pub background_story: String,

    /// Registration limit
    pub max_characters: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            background_story: String::new(),
            max_characters: 10,
        }
    }
}

impl SceneConfig {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_background_story(mut self, story: impl Into<String>) -> Self {
        self.background_story = story.into();
        self
    }

    pub fn with_max_characters(mut self, max: usize) -> Self {
        self.max_characters = max;
        self
    }

    /// Scene text handed to prompts; `None` when there is nothing to say.
    pub fn prompt_text(&self) -> Option<String> {
        let description = self.description.trim();
        let story = self.background_story.trim();
        match (description.is_empty(), story.is_empty()) {
            (true, true) => None,
            (false, true) => Some(description.to_string()),
            (true, false) => Some(story.to_string()),
            (false, false) => Some(format!("{description}\n{story}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scene_has_no_prompt_text() {
        assert_eq!(SceneConfig::default().prompt_text(), None);
    }

    #[test]
    fn prompt_text_joins_description_and_story() {
        let scene = SceneConfig::new("A harbour tavern.").with_background_story("The port is closed.");
        assert_eq!(
            scene.prompt_text().as_deref(),
            Some("A harbour tavern.\nThe port is closed.")
        );
    }
}

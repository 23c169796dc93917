//! Personality — the immutable descriptor of a character.
//!
//! A personality is built once and shared (`Arc<Personality>`) by every agent
//! that plays the character. `render` turns it into the prompt fragment that
//! opens each of the character's turns.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How much of the personality to put in a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Name, background, one trait per line, style directives
    #[default]
    Full,
    /// A single line: `Name (trait, trait): style`
    Compact,
}

/// A character's personality profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    name: String,
    traits: Vec<String>,
    style_directives: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    background: String,
}

impl Personality {
    /// Create a personality. The name must be non-blank and there must be
    /// at least one non-blank trait.
    pub fn new(
        name: impl Into<String>,
        traits: impl IntoIterator<Item = impl Into<String>>,
        style_directives: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidPersonality("name must not be empty".into()));
        }

        let traits: Vec<String> = traits
            .into_iter()
            .map(|t| t.into().trim().to_string())
            .collect();
        if traits.is_empty() {
            return Err(Error::InvalidPersonality(format!(
                "'{name}' needs at least one trait"
            )));
        }
        if traits.iter().any(String::is_empty) {
            return Err(Error::InvalidPersonality(format!(
                "'{name}' has a blank trait"
            )));
        }

        Ok(Self {
            name,
            traits,
            style_directives: style_directives.into().trim().to_string(),
            background: String::new(),
        })
    }

    /// Attach a background story.
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into().trim().to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    pub fn style_directives(&self) -> &str {
        &self.style_directives
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    /// Render the prompt fragment describing this character.
    pub fn render(&self, mode: RenderMode) -> String {
        match mode {
            RenderMode::Compact => {
                let mut out = format!("{} ({})", self.name, self.traits.join(", "));
                if !self.style_directives.is_empty() {
                    out.push_str(": ");
                    out.push_str(&self.style_directives);
                }
                out
            }
            RenderMode::Full => {
                let mut out = format!("Name: {}\n", self.name);
                if !self.background.is_empty() {
                    out.push_str(&format!("Background: {}\n", self.background));
                }
                out.push_str("Traits:\n");
                for t in &self.traits {
                    out.push_str(&format!("- {t}\n"));
                }
                if !self.style_directives.is_empty() {
                    out.push_str(&format!("Style: {}\n", self.style_directives));
                }
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Personality {
        Personality::new("Alice", ["curious", "blunt"], "Short sentences.").unwrap()
    }

    #[test]
    fn full_render_lists_traits_in_order() {
        let rendered = alice().with_background("A ship's navigator").render(RenderMode::Full);
        assert!(rendered.starts_with("Name: Alice\n"));
        assert!(rendered.contains("Background: A ship's navigator"));
        let curious = rendered.find("- curious").unwrap();
        let blunt = rendered.find("- blunt").unwrap();
        assert!(curious < blunt);
        assert!(rendered.contains("Style: Short sentences."));
    }

    #[test]
    fn compact_render_is_one_line() {
        let rendered = alice().render(RenderMode::Compact);
        assert_eq!(rendered, "Alice (curious, blunt): Short sentences.");
    }

    #[test]
    fn blank_name_rejected() {
        let err = Personality::new("  ", ["calm"], "").unwrap_err();
        assert!(matches!(err, Error::InvalidPersonality(_)));
    }

    #[test]
    fn empty_traits_rejected() {
        let err = Personality::new("Bob", Vec::<String>::new(), "").unwrap_err();
        assert!(err.to_string().contains("at least one trait"));
    }

    #[test]
    fn blank_trait_rejected() {
        assert!(Personality::new("Bob", ["calm", " "], "").is_err());
    }
}

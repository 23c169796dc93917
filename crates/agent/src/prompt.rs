//! Prompt assembly for a single turn.
//!
//! Pure and deterministic: identical inputs always produce an identical
//! prompt. Sections with nothing in them are left out entirely.

use roleplay_core::entry::Window;
use roleplay_core::personality::{Personality, RenderMode};

/// Build the prompt an agent sends to its backend.
///
/// Layout, top to bottom: character sheet, scene, private memory, recent
/// conversation, then the reply cue ending in `"{name}:"`.
pub fn build_prompt(
    personality: &Personality,
    scene: Option<&str>,
    memory: Window<'_>,
    transcript: Window<'_>,
) -> String {
    let mut prompt = String::from("You are playing a character in a shared scene.\n\n");
    prompt.push_str(&personality.render(RenderMode::Full));

    if let Some(scene) = scene.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str("\n## Scene\n");
        prompt.push_str(scene);
        prompt.push('\n');
    }

    if !memory.is_empty() {
        prompt.push_str("\n## What you remember\n");
        for entry in memory.iter() {
            prompt.push_str("- ");
            prompt.push_str(&entry.render_line());
            prompt.push('\n');
        }
    }

    if !transcript.is_empty() {
        prompt.push_str("\n## Recent conversation\n");
        prompt.push_str(&transcript.render());
        prompt.push('\n');
    }

    let name = personality.name();
    prompt.push_str(&format!(
        "\nStay in character as {name}. Reply with a single line of dialogue, \
        without repeating your name.\n{name}:"
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use roleplay_core::entry::{MemoryEntry, WindowBound};

    fn alice() -> Personality {
        Personality::new("Alice", ["curious", "blunt"], "Short sentences.")
            .unwrap()
            .with_background("A cartographer")
    }

    #[test]
    fn empty_context_has_only_sheet_and_cue() {
        let prompt = build_prompt(&alice(), None, Window::empty(), Window::empty());
        assert!(prompt.contains("Name: Alice"));
        assert!(prompt.contains("- curious"));
        assert!(!prompt.contains("## Scene"));
        assert!(!prompt.contains("## What you remember"));
        assert!(!prompt.contains("## Recent conversation"));
        assert!(prompt.ends_with("Alice:"));
    }

    #[test]
    fn sections_appear_in_order() {
        let memory = vec![MemoryEntry::observation("memory", "Bob owes Alice a map.")];
        let transcript = vec![
            MemoryEntry::utterance("Bob", "Morning."),
            MemoryEntry::utterance("Alice", "Is it?"),
        ];
        let prompt = build_prompt(
            &alice(),
            Some("A foggy harbour"),
            Window::over(&memory, WindowBound::Entries(5)),
            Window::over(&transcript, WindowBound::Entries(5)),
        );

        let scene = prompt.find("## Scene").unwrap();
        let remember = prompt.find("## What you remember").unwrap();
        let recent = prompt.find("## Recent conversation").unwrap();
        assert!(scene < remember && remember < recent);
        assert!(prompt.contains("- [observation] memory: Bob owes Alice a map."));
        assert!(prompt.contains("Bob: Morning.\nAlice: Is it?"));
    }

    #[test]
    fn blank_scene_is_skipped() {
        let prompt = build_prompt(&alice(), Some("   "), Window::empty(), Window::empty());
        assert!(!prompt.contains("## Scene"));
    }

    #[test]
    fn deterministic() {
        let transcript = vec![MemoryEntry::utterance("Bob", "Hello")];
        let window = Window::over(&transcript, WindowBound::Entries(3));
        let a = build_prompt(&alice(), Some("Inn"), Window::empty(), window);
        let b = build_prompt(&alice(), Some("Inn"), Window::empty(), window);
        assert_eq!(a, b);
    }
}

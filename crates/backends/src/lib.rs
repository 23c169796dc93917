//! Text-generation backends for Roleplay.
//!
//! All backends implement the `roleplay_core::Backend` trait. They are
//! deterministic and offline; network providers plug in through the same
//! trait from outside this workspace. `build_from_config` picks one per
//! character from configuration.

pub mod builder;
pub mod fallback;
pub mod scripted;
pub mod template;

pub use builder::build_from_config;
pub use fallback::FallbackBackend;
pub use scripted::{ScriptStep, ScriptedBackend};
pub use template::TemplateBackend;

//! Collaborator-facing game state and scene types.
//!
//! These are the inputs the orchestrator consumes but never owns: the game
//! state arrives from whatever persistence layer the host uses, and scene
//! definitions come from authored content. The engine reads them and returns
//! deltas; it never mutates a scene.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The slice of character state the engine needs to see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Identifier of the character acting.
    pub character_id: String,

    /// Named attributes (perception, willpower, cunning, ...).
    pub attributes: BTreeMap<String, i32>,

    /// Character level, used for persona adaptation and tier selection.
    pub level: u32,

    /// Choice identifiers the player has made, oldest first.
    pub choices_made: Vec<String>,
}

impl GameState {
    /// Create a fresh state for a character.
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            attributes: BTreeMap::new(),
            level: 1,
            choices_made: Vec::new(),
        }
    }

    /// Set an attribute value (builder style).
    pub fn with_attribute(mut self, name: impl Into<String>, value: i32) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Set the level (builder style).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Look up an attribute, defaulting to 0 when unset.
    pub fn attribute(&self, name: &str) -> i32 {
        self.attributes.get(name).copied().unwrap_or(0)
    }

    /// The trailing window of the most recent choices, newest last.
    pub fn recent_choices(&self, window: usize) -> &[String] {
        let start = self.choices_made.len().saturating_sub(window);
        &self.choices_made[start..]
    }
}

/// An authored scene the player is acting within.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Location identifier, also used as a memory tag.
    pub location: String,

    /// Time of day descriptor ("dusk", "the hour before dawn", ...).
    pub time_of_day: String,

    /// Weather descriptor.
    pub weather: String,

    /// Scene-setting text shown to the player and fed to generation.
    pub description: String,

    /// Choices authored for this scene.
    pub choices: Vec<SceneChoice>,
}

impl Scene {
    /// Find a choice by id.
    pub fn choice(&self, id: &str) -> Option<&SceneChoice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// One authored choice within a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneChoice {
    /// Stable identifier, recorded into `GameState::choices_made`.
    pub id: String,

    /// Player-facing text.
    pub text: String,

    /// Fixed mechanical consequences, if the author specified any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequences: Option<ChoiceConsequences>,
}

/// Fixed consequences attached to a scene choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceConsequences {
    /// Attribute deltas to apply.
    #[serde(default)]
    pub attribute_changes: BTreeMap<String, i32>,

    /// Experience granted.
    #[serde(default)]
    pub experience: u32,

    /// Health delta (negative for harm).
    #[serde(default)]
    pub health: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_choices_window() {
        let mut state = GameState::new("pc-1");
        for i in 0..8 {
            state.choices_made.push(format!("choice-{i}"));
        }

        let recent = state.recent_choices(5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0], "choice-3");
        assert_eq!(recent[4], "choice-7");

        // Window larger than history returns everything.
        assert_eq!(GameState::new("pc-2").recent_choices(5).len(), 0);
    }

    #[test]
    fn test_attribute_default() {
        let state = GameState::new("pc-1").with_attribute("perception", 12);
        assert_eq!(state.attribute("perception"), 12);
        assert_eq!(state.attribute("willpower"), 0);
    }

    #[test]
    fn test_scene_choice_lookup() {
        let scene = Scene {
            location: "old-mill".to_string(),
            time_of_day: "dusk".to_string(),
            weather: "fog".to_string(),
            description: "The mill wheel turns though the stream is dry.".to_string(),
            choices: vec![SceneChoice {
                id: "enter".to_string(),
                text: "Step inside".to_string(),
                consequences: None,
            }],
        };

        assert!(scene.choice("enter").is_some());
        assert!(scene.choice("flee").is_none());
    }
}

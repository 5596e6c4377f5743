//! The narrator's persona: a fixed catalog of behavioral profiles and the
//! rules that move the active profile between them.
//!
//! The active persona is a pointer into the catalog; switching is a full
//! replacement, never a partial merge. Adaptation rules run in a fixed
//! priority order and the first match wins.

pub mod patterns;

use patterns::ChoiceLeaning;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Supernatural brushes in the choice window above which the narrator turns
/// enigmatic (when the player is also high level).
const AWAKENED_EVENT_THRESHOLD: usize = 3;

/// Player level at or above which the enigmatic switch can fire.
const AWAKENED_LEVEL: u32 = 10;

/// Matching choices in the window needed for the aggressive/curious rules.
const LEANING_THRESHOLD: usize = 3;

/// Chance of a spontaneous switch to a uniformly random profile when no
/// rule matched.
const RANDOM_SWITCH_CHANCE: f64 = 0.1;

/// Relative appetite for each encounter flavor. Weights sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncounterBias {
    pub peaceful: f64,
    pub hostile: f64,
    pub mysterious: f64,
    pub beneficial: f64,
}

/// An immutable narrator profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Personality {
    /// Display name.
    pub name: &'static str,
    /// Dominant mood tag.
    pub mood: &'static str,
    /// Trait descriptors.
    pub traits: &'static [&'static str],
    /// Content the profile leans into.
    pub preferred: &'static [&'static str],
    /// Content the profile refuses to produce.
    pub forbidden: &'static [&'static str],
    /// Narrative-style descriptor fed to generation.
    pub style: &'static str,
    /// Encounter flavor appetite.
    pub bias: EncounterBias,
}

/// The enigmatic profile, target of the awakened-player rule.
pub static KEEPER_OF_VEILS: Personality = Personality {
    name: "Keeper of Veils",
    mood: "enigmatic",
    traits: &["oblique", "patient", "knowing"],
    preferred: &["riddles", "half-glimpsed truths", "meaningful silence"],
    forbidden: &["plain answers", "comic relief"],
    style: "speaks around the truth, letting the player assemble it",
    bias: EncounterBias {
        peaceful: 0.15,
        hostile: 0.15,
        mysterious: 0.6,
        beneficial: 0.1,
    },
};

/// The stern profile, target of the aggression rule.
pub static IRON_WARDEN: Personality = Personality {
    name: "Iron Warden",
    mood: "stern",
    traits: &["unyielding", "exacting", "watchful"],
    preferred: &["consequences", "hard bargains", "tests of resolve"],
    forbidden: &["easy forgiveness", "unearned rewards"],
    style: "measures every word, and every act is weighed",
    bias: EncounterBias {
        peaceful: 0.1,
        hostile: 0.5,
        mysterious: 0.25,
        beneficial: 0.15,
    },
};

/// The trickster profile, target of the curiosity rule.
pub static LAUGHING_SHADOW: Personality = Personality {
    name: "Laughing Shadow",
    mood: "playful",
    traits: &["mischievous", "quick", "fond of the curious"],
    preferred: &["games", "reversals", "rewards for looking twice"],
    forbidden: &["cruelty without wit"],
    style: "teases and misdirects, kinder than it first appears",
    bias: EncounterBias {
        peaceful: 0.25,
        hostile: 0.1,
        mysterious: 0.4,
        beneficial: 0.25,
    },
};

/// The measured default profile.
pub static QUIET_CHRONICLER: Personality = Personality {
    name: "Quiet Chronicler",
    mood: "measured",
    traits: &["even-handed", "observant", "unhurried"],
    preferred: &["texture", "small details", "honest consequences"],
    forbidden: &["melodrama"],
    style: "records the world as it is, and lets it speak",
    bias: EncounterBias {
        peaceful: 0.3,
        hostile: 0.2,
        mysterious: 0.3,
        beneficial: 0.2,
    },
};

/// A warm, protective profile.
pub static GENTLE_LANTERN: Personality = Personality {
    name: "Gentle Lantern",
    mood: "warm",
    traits: &["kind", "encouraging", "protective"],
    preferred: &["shelter", "small mercies", "help arriving"],
    forbidden: &["hopelessness", "gratuitous horror"],
    style: "finds the light in the scene and holds it up",
    bias: EncounterBias {
        peaceful: 0.4,
        hostile: 0.05,
        mysterious: 0.2,
        beneficial: 0.35,
    },
};

/// An ominous, hungry profile.
pub static HUNGERING_DARK: Personality = Personality {
    name: "Hungering Dark",
    mood: "ominous",
    traits: &["looming", "patient", "hungry"],
    preferred: &["dread", "the cost of curiosity", "things best left closed"],
    forbidden: &["reassurance"],
    style: "narrates as though something is listening",
    bias: EncounterBias {
        peaceful: 0.05,
        hostile: 0.45,
        mysterious: 0.45,
        beneficial: 0.05,
    },
};

/// The closed catalog, in a fixed order for the uniform random switch.
pub static CATALOG: [&Personality; 6] = [
    &KEEPER_OF_VEILS,
    &IRON_WARDEN,
    &LAUGHING_SHADOW,
    &QUIET_CHRONICLER,
    &GENTLE_LANTERN,
    &HUNGERING_DARK,
];

/// Look up a catalog profile by name.
pub fn profile_by_name(name: &str) -> Option<&'static Personality> {
    CATALOG.iter().copied().find(|p| p.name == name)
}

/// Holds the active profile and applies the adaptation rules.
#[derive(Debug, Clone)]
pub struct PersonaManager {
    active: &'static Personality,
}

impl PersonaManager {
    /// Start with the measured default profile.
    pub fn new() -> Self {
        Self {
            active: &QUIET_CHRONICLER,
        }
    }

    /// Start with a specific profile.
    pub fn with_profile(profile: &'static Personality) -> Self {
        Self { active: profile }
    }

    /// The currently active profile.
    pub fn active(&self) -> &'static Personality {
        self.active
    }

    /// Replace the active profile wholesale.
    pub fn switch_to(&mut self, profile: &'static Personality) {
        if !std::ptr::eq(self.active, profile) {
            debug!(from = self.active.name, to = profile.name, "persona switch");
        }
        self.active = profile;
    }

    /// Apply the adaptation rules to recent play, switching the active
    /// profile if one fires. Rules are checked in priority order; the first
    /// match wins. Returns the name of the new profile on a switch.
    ///
    /// 1. Heavy supernatural contact and a high-level player → enigmatic.
    /// 2. Aggressive play → stern.
    /// 3. Curious play → trickster.
    /// 4. Small chance of a spontaneous switch to a random profile.
    pub fn adapt(
        &mut self,
        player_level: u32,
        recent_choices: &[String],
        supernatural_events: usize,
    ) -> Option<&'static str> {
        self.adapt_with_rng(
            player_level,
            recent_choices,
            supernatural_events,
            &mut rand::thread_rng(),
        )
    }

    /// Rule evaluation with a caller-supplied RNG (for deterministic tests).
    pub fn adapt_with_rng(
        &mut self,
        player_level: u32,
        recent_choices: &[String],
        supernatural_events: usize,
        rng: &mut impl Rng,
    ) -> Option<&'static str> {
        let target: Option<&'static Personality> =
            if supernatural_events > AWAKENED_EVENT_THRESHOLD && player_level >= AWAKENED_LEVEL {
                Some(&KEEPER_OF_VEILS)
            } else if patterns::count_leaning(recent_choices, ChoiceLeaning::Aggressive)
                >= LEANING_THRESHOLD
            {
                Some(&IRON_WARDEN)
            } else if patterns::count_leaning(recent_choices, ChoiceLeaning::Curious)
                >= LEANING_THRESHOLD
            {
                Some(&LAUGHING_SHADOW)
            } else if rng.gen::<f64>() < RANDOM_SWITCH_CHANCE {
                Some(CATALOG[rng.gen_range(0..CATALOG.len())])
            } else {
                None
            };

        match target {
            Some(profile) if !std::ptr::eq(profile, self.active) => {
                self.switch_to(profile);
                Some(profile.name)
            }
            _ => None,
        }
    }

    /// Render the active profile as the persona block of a generation
    /// request's system instructions.
    pub fn prompt_block(&self) -> String {
        let p = self.active;
        let mut block = String::new();
        block.push_str(&format!("## Narrator Persona: {}\n", p.name));
        block.push_str(&format!("Mood: {}. Style: {}.\n", p.mood, p.style));
        block.push_str(&format!("Traits: {}.\n", p.traits.join(", ")));
        if !p.preferred.is_empty() {
            block.push_str(&format!("Lean into: {}.\n", p.preferred.join("; ")));
        }
        if !p.forbidden.is_empty() {
            block.push_str(&format!("Never produce: {}.\n", p.forbidden.join("; ")));
        }
        block
    }
}

impl Default for PersonaManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn choices(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_biases_sum_to_one() {
        for profile in CATALOG {
            let b = profile.bias;
            let total = b.peaceful + b.hostile + b.mysterious + b.beneficial;
            assert!(
                (total - 1.0).abs() < 1e-9,
                "{} bias sums to {total}",
                profile.name
            );
        }
    }

    #[test]
    fn test_awakened_rule_beats_aggression() {
        let mut manager = PersonaManager::new();
        let mut rng = StdRng::seed_from_u64(7);

        // Both the enigmatic gate and the aggression gate are satisfied;
        // rule order says enigmatic wins.
        let aggressive = choices(&["attack_a", "attack_b", "attack_c", "attack_d"]);
        let switched = manager.adapt_with_rng(12, &aggressive, 5, &mut rng);

        assert_eq!(switched, Some("Keeper of Veils"));
        assert_eq!(manager.active().name, "Keeper of Veils");
    }

    #[test]
    fn test_awakened_rule_needs_level() {
        let mut manager = PersonaManager::new();
        let mut rng = StdRng::seed_from_u64(7);

        let aggressive = choices(&["attack_a", "attack_b", "attack_c"]);
        let switched = manager.adapt_with_rng(3, &aggressive, 5, &mut rng);

        // Level too low for enigmatic, so the aggression rule fires instead.
        assert_eq!(switched, Some("Iron Warden"));
    }

    #[test]
    fn test_curiosity_rule() {
        let mut manager = PersonaManager::new();
        let mut rng = StdRng::seed_from_u64(7);

        let curious = choices(&["examine_door", "search_cellar", "ask_ferryman"]);
        let switched = manager.adapt_with_rng(2, &curious, 0, &mut rng);

        assert_eq!(switched, Some("Laughing Shadow"));
    }

    #[test]
    fn test_no_rule_no_random_no_switch() {
        let mut manager = PersonaManager::new();
        // gen::<f64>() well above the 10% switch chance for this seed range:
        // verify by repetition that non-switch runs leave the profile alone.
        let mut rng = StdRng::seed_from_u64(42);
        let quiet = choices(&["wait", "rest"]);

        let mut switches = 0;
        for _ in 0..1000 {
            manager = PersonaManager::new();
            if manager.adapt_with_rng(1, &quiet, 0, &mut rng).is_some() {
                switches += 1;
            }
        }

        // The random rule fires about 10% of the time, and a switch is only
        // reported when the target differs from the active profile.
        assert!(switches > 30, "random switches: {switches}");
        assert!(switches < 200, "random switches: {switches}");
    }

    #[test]
    fn test_switch_to_same_profile_reports_none() {
        let mut manager = PersonaManager::with_profile(&KEEPER_OF_VEILS);
        let mut rng = StdRng::seed_from_u64(7);

        let switched = manager.adapt_with_rng(12, &[], 5, &mut rng);
        assert_eq!(switched, None);
        assert_eq!(manager.active().name, "Keeper of Veils");
    }

    #[test]
    fn test_prompt_block_mentions_profile() {
        let manager = PersonaManager::with_profile(&HUNGERING_DARK);
        let block = manager.prompt_block();
        assert!(block.contains("Hungering Dark"));
        assert!(block.contains("ominous"));
        assert!(block.contains("Never produce"));
    }

    #[test]
    fn test_profile_lookup() {
        assert!(profile_by_name("Iron Warden").is_some());
        assert!(profile_by_name("Unknown").is_none());
    }
}

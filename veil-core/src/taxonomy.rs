//! The closed taxonomy of supernatural manifestations.
//!
//! Every manifestation the engine can produce belongs to one of these eight
//! kinds. The taxonomy is exhaustive by construction: prompt builders,
//! fallback content, unlock thresholds, and attribute bonuses all dispatch on
//! `ManifestationKind` with exhaustive matches, so adding a kind without its
//! data is a compile error rather than a runtime surprise.

use serde::{Deserialize, Serialize};

/// One member of the closed set of supernatural phenomena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestationKind {
    /// Substitute-beings that replace people or things with near-copies.
    Changeling,
    /// Entities that reach across the veil to make contact.
    Harbinger,
    /// Hungering things that consume flesh, memory, or warmth.
    Devourer,
    /// Folkloric spirits with old rules and older grudges.
    FolkSpirit,
    /// The restless dead, bound by unfinished business.
    Revenant,
    /// Collective resentment thickened into a presence.
    Miasma,
    /// Minor nature spirits of grove, stream, and stone.
    Sprite,
    /// Ordinary objects animated by long use and attention.
    Vessel,
}

/// How threatening an encounter is to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl DangerLevel {
    /// Display name, lowercase, for prompts and digests.
    pub fn name(&self) -> &'static str {
        match self {
            DangerLevel::Low => "low",
            DangerLevel::Medium => "medium",
            DangerLevel::High => "high",
            DangerLevel::Extreme => "extreme",
        }
    }
}

impl ManifestationKind {
    /// All kinds, in taxonomy order.
    pub const ALL: [ManifestationKind; 8] = [
        ManifestationKind::Changeling,
        ManifestationKind::Harbinger,
        ManifestationKind::Devourer,
        ManifestationKind::FolkSpirit,
        ManifestationKind::Revenant,
        ManifestationKind::Miasma,
        ManifestationKind::Sprite,
        ManifestationKind::Vessel,
    ];

    /// Display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ManifestationKind::Changeling => "Changeling",
            ManifestationKind::Harbinger => "Harbinger",
            ManifestationKind::Devourer => "Devourer",
            ManifestationKind::FolkSpirit => "Folk Spirit",
            ManifestationKind::Revenant => "Revenant",
            ManifestationKind::Miasma => "Miasma",
            ManifestationKind::Sprite => "Sprite",
            ManifestationKind::Vessel => "Vessel",
        }
    }

    /// Narrative themes this kind draws on, used in generation prompts.
    pub fn themes(&self) -> &'static [&'static str] {
        match self {
            ManifestationKind::Changeling => {
                &["identity", "substitution", "the almost-right face", "trust eroded"]
            }
            ManifestationKind::Harbinger => {
                &["contact", "omens", "messages from beyond", "unbearable knowledge"]
            }
            ManifestationKind::Devourer => {
                &["hunger", "consumption", "absence", "things gone missing from memory"]
            }
            ManifestationKind::FolkSpirit => {
                &["old bargains", "rules of hospitality", "tricks", "debts owed the land"]
            }
            ManifestationKind::Revenant => {
                &["unfinished business", "grief", "return", "what the living owe the dead"]
            }
            ManifestationKind::Miasma => {
                &["collective resentment", "bad air", "a grudge shared by many", "places gone sour"]
            }
            ManifestationKind::Sprite => {
                &["small wonders", "mischief", "the stream's opinion", "green and growing things"]
            }
            ManifestationKind::Vessel => {
                &["worn objects", "accumulated attention", "tools with preferences", "the house remembers"]
            }
        }
    }

    /// Conditions under which this kind tends to appear.
    pub fn trigger_conditions(&self) -> &'static [&'static str] {
        match self {
            ManifestationKind::Changeling => {
                &["a loved one behaving strangely", "mirrors and doubles", "long absences"]
            }
            ManifestationKind::Harbinger => {
                &["thresholds and crossroads", "the hour before dawn", "unanswered questions"]
            }
            ManifestationKind::Devourer => {
                &["deep hunger nearby", "abandoned larders", "names no one remembers"]
            }
            ManifestationKind::FolkSpirit => {
                &["broken customs", "disrespected places", "offers refused rudely"]
            }
            ManifestationKind::Revenant => {
                &["fresh graves", "unkept promises", "anniversaries of loss"]
            }
            ManifestationKind::Miasma => {
                &["sites of injustice", "crowds that remember", "sealed rooms"]
            }
            ManifestationKind::Sprite => {
                &["wild margins", "offerings left out", "children playing alone"]
            }
            ManifestationKind::Vessel => {
                &["heirlooms", "workshops at night", "objects handled for generations"]
            }
        }
    }

    /// How this kind tends to show itself in a scene.
    pub fn manifestation_styles(&self) -> &'static [&'static str] {
        match self {
            ManifestationKind::Changeling => {
                &["a familiar face a half-second off", "borrowed voices", "wrong reflections"]
            }
            ManifestationKind::Harbinger => {
                &["birds where no birds should be", "words arriving unbidden", "a figure at the edge of sight"]
            }
            ManifestationKind::Devourer => {
                &["cold spots that follow", "food spoiling", "a gnawing silence"]
            }
            ManifestationKind::FolkSpirit => {
                &["knots and braided grass", "milk gone sweet or sour", "laughter from empty air"]
            }
            ManifestationKind::Revenant => {
                &["footsteps retracing old routes", "doors unlatched at night", "a smell of turned earth"]
            }
            ManifestationKind::Miasma => {
                &["a weight in the chest", "whispers with many voices", "lamplight dimming as one"]
            }
            ManifestationKind::Sprite => {
                &["misplaced small objects", "sudden wind in still air", "lights between the trees"]
            }
            ManifestationKind::Vessel => {
                &["tools found rearranged", "a chair that will not stay put", "music from a closed case"]
            }
        }
    }

    /// The pair of character attributes this kind's evolution bonus feeds.
    pub fn attribute_pair(&self) -> (&'static str, &'static str) {
        match self {
            ManifestationKind::Changeling => ("perception", "empathy"),
            ManifestationKind::Harbinger => ("perception", "willpower"),
            ManifestationKind::Devourer => ("willpower", "endurance"),
            ManifestationKind::FolkSpirit => ("cunning", "empathy"),
            ManifestationKind::Revenant => ("willpower", "empathy"),
            ManifestationKind::Miasma => ("willpower", "perception"),
            ManifestationKind::Sprite => ("cunning", "agility"),
            ManifestationKind::Vessel => ("cunning", "perception"),
        }
    }

    /// The character class unlocked by repeated success against this kind.
    pub fn unlock_class(&self) -> &'static str {
        match self {
            ManifestationKind::Changeling => "Facekeeper",
            ManifestationKind::Harbinger => "Threshold Warden",
            ManifestationKind::Devourer => "Sin Eater",
            ManifestationKind::FolkSpirit => "Hedge Bargainer",
            ManifestationKind::Revenant => "Gravewarden",
            ManifestationKind::Miasma => "Stillheart",
            ManifestationKind::Sprite => "Greenfriend",
            ManifestationKind::Vessel => "Curio Binder",
        }
    }

    /// Successful encounters required before `unlock_class` becomes available.
    pub fn unlock_threshold(&self) -> u32 {
        match self {
            ManifestationKind::Sprite | ManifestationKind::Vessel => 3,
            ManifestationKind::FolkSpirit | ManifestationKind::Changeling => 5,
            ManifestationKind::Revenant | ManifestationKind::Miasma => 7,
            ManifestationKind::Harbinger | ManifestationKind::Devourer => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_exhaustive() {
        // One entry per variant, no duplicates.
        let mut kinds: Vec<_> = ManifestationKind::ALL.to_vec();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), 8);
    }

    #[test]
    fn test_metadata_nonempty() {
        for kind in ManifestationKind::ALL {
            assert!(!kind.name().is_empty());
            assert!(!kind.themes().is_empty());
            assert!(!kind.trigger_conditions().is_empty());
            assert!(!kind.manifestation_styles().is_empty());
            assert!(!kind.unlock_class().is_empty());
            assert!(kind.unlock_threshold() > 0);
        }
    }

    #[test]
    fn test_unlock_classes_distinct() {
        let mut classes: Vec<_> = ManifestationKind::ALL
            .iter()
            .map(|k| k.unlock_class())
            .collect();
        classes.sort();
        classes.dedup();
        assert_eq!(classes.len(), 8);
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&ManifestationKind::FolkSpirit).unwrap();
        assert_eq!(json, "\"folk_spirit\"");
        let back: ManifestationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ManifestationKind::FolkSpirit);
    }
}

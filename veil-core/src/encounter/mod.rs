//! Supernatural encounter selection, generation, and resolution.
//!
//! Selection is pure probability-table work and takes a caller-supplied RNG
//! so tests can drive the distributions. Generation goes through the
//! [`TextSource`] seam and always lands somewhere: if the service fails or
//! returns something unusable, the complete static fallback catalog supplies
//! the encounter instead.

pub mod tables;

use crate::evolution::EvolutionTracker;
use crate::generation::{GenerationRequest, TextSource};
use crate::narrator::response::extract_json;
use crate::taxonomy::{DangerLevel, ManifestationKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;
use uuid::Uuid;

/// Encounter probability never exceeds this, however aware the character.
const TARGETED_PROBABILITY_CAP: f64 = 0.8;

/// Unique identifier for an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncounterId(Uuid);

impl EncounterId {
    /// Create a new unique encounter ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EncounterId {
    fn default() -> Self {
        Self::new()
    }
}

/// How seasoned the character is, for tier probability tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceTier {
    Novice,
    Experienced,
    Veteran,
}

impl ExperienceTier {
    /// Map a character level onto a tier.
    pub fn for_level(level: u32) -> Self {
        match level {
            0..=4 => ExperienceTier::Novice,
            5..=9 => ExperienceTier::Experienced,
            _ => ExperienceTier::Veteran,
        }
    }

    /// The fixed probability table for this tier. Each table sums to 1.0;
    /// novices meet the small and strange, veterans the old and hungry.
    pub fn probability_table(&self) -> [(ManifestationKind, f64); 8] {
        use ManifestationKind::*;
        match self {
            ExperienceTier::Novice => [
                (Sprite, 0.30),
                (Vessel, 0.25),
                (FolkSpirit, 0.20),
                (Changeling, 0.15),
                (Revenant, 0.05),
                (Miasma, 0.03),
                (Harbinger, 0.01),
                (Devourer, 0.01),
            ],
            ExperienceTier::Experienced => [
                (Sprite, 0.15),
                (Vessel, 0.15),
                (FolkSpirit, 0.20),
                (Changeling, 0.18),
                (Revenant, 0.12),
                (Miasma, 0.10),
                (Harbinger, 0.06),
                (Devourer, 0.04),
            ],
            ExperienceTier::Veteran => [
                (Sprite, 0.05),
                (Vessel, 0.08),
                (FolkSpirit, 0.12),
                (Changeling, 0.15),
                (Revenant, 0.20),
                (Miasma, 0.15),
                (Harbinger, 0.13),
                (Devourer, 0.12),
            ],
        }
    }
}

/// Select a manifestation kind from a tier's table: one uniform draw,
/// resolved by cumulative-sum lookup.
pub fn roll_manifestation(tier: ExperienceTier, rng: &mut impl Rng) -> ManifestationKind {
    let draw: f64 = rng.gen();
    let mut cumulative = 0.0;
    let table = tier.probability_table();
    for (kind, probability) in table {
        cumulative += probability;
        if draw < cumulative {
            return kind;
        }
    }
    // Floating-point shortfall at the very top of the range.
    table[table.len() - 1].0
}

/// Spiritual awareness derived from the perceiving attributes.
pub fn spiritual_awareness(perception: i32, willpower: i32) -> i32 {
    (perception + willpower) / 2
}

/// The pair of kinds a character with this awareness can draw.
pub fn awareness_band(awareness: i32) -> [ManifestationKind; 2] {
    use ManifestationKind::*;
    if awareness < 7 {
        [Sprite, Vessel]
    } else if awareness < 10 {
        [FolkSpirit, Changeling]
    } else if awareness < 13 {
        [Revenant, Miasma]
    } else {
        [Harbinger, Devourer]
    }
}

/// Maybe select a manifestation targeted at a character's awareness.
///
/// Probability is `min(0.8, awareness / 20)`; no encounter when the draw
/// exceeds it. The band restricts candidates to two thematically fitting
/// kinds, with a fair coin between them.
pub fn targeted_manifestation(
    perception: i32,
    willpower: i32,
    rng: &mut impl Rng,
) -> Option<ManifestationKind> {
    let awareness = spiritual_awareness(perception, willpower);
    let probability = (awareness as f64 / 20.0).min(TARGETED_PROBABILITY_CAP);
    if rng.gen::<f64>() > probability {
        return None;
    }

    let band = awareness_band(awareness);
    Some(if rng.gen::<bool>() { band[0] } else { band[1] })
}

/// Staged effects an encounter has on the player.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerEffects {
    pub immediate: String,
    pub gradual: String,
    pub permanent: String,
}

/// The authored ways an encounter can be settled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionOptions {
    pub peaceful: String,
    pub confrontational: String,
    pub avoidance: String,
}

/// A fully formed encounter, generated or fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureEncounter {
    pub id: EncounterId,
    pub kind: ManifestationKind,
    pub description: String,
    pub danger: DangerLevel,
    pub clues: Vec<String>,
    pub manifestations: Vec<String>,
    pub effects: PlayerEffects,
    pub resolutions: ResolutionOptions,
}

/// How the player chose to handle an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Peaceful,
    Confrontational,
    Avoidance,
    Observe,
}

impl Resolution {
    /// Parse a resolution keyword.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "peaceful" => Some(Resolution::Peaceful),
            "confrontational" => Some(Resolution::Confrontational),
            "avoidance" => Some(Resolution::Avoidance),
            "observe" => Some(Resolution::Observe),
            _ => None,
        }
    }
}

/// The mechanical result of resolving an encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub kind: ManifestationKind,
    pub resolution: Resolution,
    pub success: bool,
    pub experience: u32,
    pub attribute_changes: BTreeMap<String, i32>,
    pub learned_lesson: Option<String>,
    pub granted_power: Option<String>,
    /// Class newly unlocked by this encounter, if any.
    pub unlocked_class: Option<String>,
}

/// Builds generation prompts, parses responses, and applies resolutions.
#[derive(Debug, Clone)]
pub struct EncounterEngine {
    /// Token budget for encounter generation.
    max_tokens: usize,
}

impl EncounterEngine {
    /// Create an engine with the default token budget.
    pub fn new() -> Self {
        Self { max_tokens: 1024 }
    }

    /// Generate an encounter of the given kind in the given situational
    /// context. Infallible: any service or parse failure falls back to the
    /// static catalog entry for the kind.
    pub async fn generate(
        &self,
        source: &dyn TextSource,
        kind: ManifestationKind,
        context: &str,
    ) -> CreatureEncounter {
        let request = self.build_request(kind, context);

        match source.generate(&request).await {
            Ok(text) => match parse_encounter(kind, &text) {
                Some(encounter) => encounter,
                None => {
                    warn!(kind = kind.name(), "unparsable encounter response, using fallback");
                    tables::fallback_encounter(kind)
                }
            },
            Err(error) => {
                warn!(kind = kind.name(), %error, "encounter generation failed, using fallback");
                tables::fallback_encounter(kind)
            }
        }
    }

    fn build_request(&self, kind: ManifestationKind, context: &str) -> GenerationRequest {
        let mut system = String::new();
        system.push_str(
            "You author a single supernatural encounter for a grounded, folklore-\
             inflected roleplaying scene.\n\n",
        );
        system.push_str(&format!("Category themes: {}.\n", kind.themes().join("; ")));
        system.push_str(&format!(
            "It tends to appear when: {}.\n",
            kind.trigger_conditions().join("; ")
        ));
        system.push_str(&format!(
            "It tends to show itself as: {}.\n\n",
            kind.manifestation_styles().join("; ")
        ));
        system.push_str(include_str!("prompts/encounter_format.txt"));

        let prompt = format!("Current situation:\n{context}\nAuthor the encounter now.");

        GenerationRequest::new(system, prompt).with_max_tokens(self.max_tokens)
    }

    /// Resolve an encounter of `kind` with the chosen approach, recording
    /// the outcome into the evolution tracker.
    pub fn resolve(
        &self,
        kind: ManifestationKind,
        resolution: Resolution,
        evolution: &mut EvolutionTracker,
    ) -> ResolutionOutcome {
        self.resolve_with_rng(kind, resolution, evolution, &mut rand::thread_rng())
    }

    /// Resolution with a caller-supplied RNG (for deterministic tests).
    pub fn resolve_with_rng(
        &self,
        kind: ManifestationKind,
        resolution: Resolution,
        evolution: &mut EvolutionTracker,
        rng: &mut impl Rng,
    ) -> ResolutionOutcome {
        let (chance, xp_success, xp_failure, attribute) = tables::resolution_effects(resolution);
        let success = rng.gen::<f64>() < chance;

        let mut attribute_changes = BTreeMap::new();
        let (experience, lesson, power) = if success {
            attribute_changes.insert(attribute.to_string(), 1);
            (
                xp_success,
                tables::learned_lesson(kind, resolution).map(String::from),
                tables::granted_power(kind, resolution).map(String::from),
            )
        } else {
            (xp_failure, None, None)
        };

        let unlocked_class =
            evolution.record_creature_encounter(kind, success, lesson.clone(), power.clone());

        ResolutionOutcome {
            kind,
            resolution,
            success,
            experience,
            attribute_changes,
            learned_lesson: lesson,
            granted_power: power,
            unlocked_class,
        }
    }
}

impl Default for EncounterEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape of a generated encounter response. Lenient: missing pieces are
/// filled from the fallback catalog; an empty description means the
/// response is unusable.
#[derive(Debug, Deserialize)]
struct GeneratedEncounter {
    description: String,
    #[serde(default)]
    danger: Option<String>,
    #[serde(default)]
    clues: Vec<String>,
    #[serde(default)]
    manifestations: Vec<String>,
    #[serde(default)]
    effects: Option<PlayerEffects>,
    #[serde(default)]
    resolutions: Option<ResolutionOptions>,
}

fn parse_danger(input: &str) -> Option<DangerLevel> {
    match input.trim().to_lowercase().as_str() {
        "low" => Some(DangerLevel::Low),
        "medium" => Some(DangerLevel::Medium),
        "high" => Some(DangerLevel::High),
        "extreme" => Some(DangerLevel::Extreme),
        _ => None,
    }
}

/// Parse a generation response into an encounter, or `None` when it is
/// unusable and the caller should fall back.
fn parse_encounter(kind: ManifestationKind, text: &str) -> Option<CreatureEncounter> {
    let value = extract_json(text)?;
    let generated: GeneratedEncounter = serde_json::from_value(value).ok()?;

    if generated.description.trim().is_empty() {
        return None;
    }

    let fallback = tables::fallback_encounter(kind);

    Some(CreatureEncounter {
        id: EncounterId::new(),
        kind,
        description: generated.description,
        danger: generated
            .danger
            .as_deref()
            .and_then(parse_danger)
            .unwrap_or_else(|| tables::default_danger(kind)),
        clues: if generated.clues.is_empty() {
            fallback.clues
        } else {
            generated.clues
        },
        manifestations: if generated.manifestations.is_empty() {
            fallback.manifestations
        } else {
            generated.manifestations
        },
        effects: generated.effects.unwrap_or(fallback.effects),
        resolutions: generated.resolutions.unwrap_or(fallback.resolutions),
    })
}

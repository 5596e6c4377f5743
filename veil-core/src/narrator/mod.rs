//! The narrator: the orchestrator that turns a player action into
//! narration, memory, encounters, and progression.
//!
//! Everything routes through [`Narrator::process_action`]. It is infallible
//! by contract: generation failures, timeouts, and malformed responses all
//! degrade to fixed neutral narration rather than surfacing an error, so a
//! host can always show the player *something*.

pub mod response;

use crate::encounter::{
    roll_manifestation, tables, CreatureEncounter, EncounterEngine, ExperienceTier, Resolution,
    ResolutionOutcome,
};
use crate::evolution::{EvolutionSnapshot, EvolutionTracker};
use crate::generation::{GenerationError, GenerationRequest, TextSource};
use crate::memory::{Importance, MemoryContent, MemoryEntry, MemorySnapshot, MemoryStore};
use crate::persona::{patterns, profile_by_name, PersonaManager};
use crate::state::{GameState, Scene};
use crate::taxonomy::DangerLevel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use response::NarrativeOutput;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Baseline chance of a random encounter per action.
const ENCOUNTER_BASE_CHANCE: f64 = 0.1;

/// How strongly the active persona's taste for mystery raises the
/// encounter chance.
const ENCOUNTER_BIAS_SCALE: f64 = 0.4;

/// Experience granted for a free-form action with no authored consequences.
const FREEFORM_XP_MIN: u32 = 5;
const FREEFORM_XP_MAX: u32 = 15;

/// Window of recent choices fed to persona adaptation.
const ADAPTATION_WINDOW: usize = 5;

/// Tuning for the narrator's use of the text source.
#[derive(Debug, Clone)]
pub struct NarratorConfig {
    /// Model override passed through to the source, if any.
    pub model: Option<String>,

    /// Token budget for narration.
    pub max_tokens: usize,

    /// Sampling temperature for narration.
    pub temperature: f32,

    /// How long to wait on the source before falling back.
    pub generation_timeout: Duration,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 1024,
            temperature: 0.9,
            generation_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything one processed action produced.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Player-facing narration. Always present, possibly the neutral
    /// fallback.
    pub narration: String,

    /// One-word emotional register of the narration.
    pub mood: String,

    /// Notable world events the action caused.
    pub events: Vec<String>,

    /// A supernatural encounter, if one manifested this action.
    pub encounter: Option<CreatureEncounter>,

    /// Attribute deltas from the chosen scene choice.
    pub attribute_changes: BTreeMap<String, i32>,

    /// Experience granted.
    pub experience: u32,

    /// Health delta from the chosen scene choice.
    pub health: i32,

    /// Name of the persona the narrator switched to, if it adapted.
    pub persona_switch: Option<&'static str>,
}

/// The narrative orchestrator. Owns the memory store, persona, encounter
/// engine, and evolution tracker for one ongoing chronicle.
pub struct Narrator {
    source: Box<dyn TextSource>,
    config: NarratorConfig,
    persona: PersonaManager,
    memory: MemoryStore,
    evolution: EvolutionTracker,
    encounters: EncounterEngine,
}

impl Narrator {
    /// Create a narrator for a character over the given text source.
    pub fn new(character_id: impl Into<String>, source: Box<dyn TextSource>) -> Self {
        Self {
            source,
            config: NarratorConfig::default(),
            persona: PersonaManager::new(),
            memory: MemoryStore::new(),
            evolution: EvolutionTracker::new(character_id),
            encounters: EncounterEngine::new(),
        }
    }

    /// Replace the default configuration (builder style).
    pub fn with_config(mut self, config: NarratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The narrative memory store.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Mutable access to the memory store, for hosts that record their own
    /// world events.
    pub fn memory_mut(&mut self) -> &mut MemoryStore {
        &mut self.memory
    }

    /// The persona manager.
    pub fn persona(&self) -> &PersonaManager {
        &self.persona
    }

    /// The character's progression ledger.
    pub fn evolution(&self) -> &EvolutionTracker {
        &self.evolution
    }

    /// Process one player action end to end. Never fails: any generation
    /// problem degrades to neutral narration.
    pub async fn process_action(
        &mut self,
        state: &GameState,
        scene: &Scene,
        action: &str,
        choice_id: Option<&str>,
    ) -> ActionOutcome {
        let mut rng = StdRng::from_entropy();
        self.process_action_with_rng(state, scene, action, choice_id, &mut rng)
            .await
    }

    /// Action processing with a caller-supplied RNG (for deterministic
    /// tests).
    pub async fn process_action_with_rng(
        &mut self,
        state: &GameState,
        scene: &Scene,
        action: &str,
        choice_id: Option<&str>,
        rng: &mut (impl Rng + Send),
    ) -> ActionOutcome {
        // Adapt the persona to recent play before narrating.
        let supernatural_events = patterns::count_supernatural(&state.choices_made);
        let persona_switch = self.persona.adapt_with_rng(
            state.level,
            state.recent_choices(ADAPTATION_WINDOW),
            supernatural_events,
            rng,
        );

        let context = self
            .memory
            .narrative_context(&scene.location, &state.character_id);

        let output = self.narrate(state, scene, action, &context).await;

        let encounter = self
            .maybe_encounter(state, scene, &context, rng)
            .await;

        // Authored choices carry fixed consequences; free-form actions earn
        // a small random award instead.
        let consequences = choice_id
            .and_then(|id| scene.choice(id))
            .and_then(|choice| choice.consequences.clone());
        let (attribute_changes, experience, health) = match consequences {
            Some(c) => (c.attribute_changes, c.experience, c.health),
            None => (
                BTreeMap::new(),
                rng.gen_range(FREEFORM_XP_MIN..=FREEFORM_XP_MAX),
                0,
            ),
        };

        self.memory.add_memory(
            MemoryEntry::new(
                Importance::Minor,
                MemoryContent::PlayerAction {
                    action: action.to_string(),
                    location_id: scene.location.clone(),
                },
            )
            .with_tag(scene.location.clone())
            .with_tag(state.character_id.clone()),
        );

        for event in &output.events {
            self.memory.record(
                Importance::Minor,
                MemoryContent::Event {
                    description: event.clone(),
                },
            );
        }

        ActionOutcome {
            narration: output.narration,
            mood: output
                .mood
                .unwrap_or_else(|| response::FALLBACK_MOOD.to_string()),
            events: output.events,
            encounter,
            attribute_changes,
            experience,
            health,
            persona_switch,
        }
    }

    /// Resolve a standing encounter with the chosen approach, feeding the
    /// outcome into the progression ledger and the memory store.
    pub fn resolve_encounter(
        &mut self,
        encounter: &CreatureEncounter,
        resolution: Resolution,
    ) -> ResolutionOutcome {
        let outcome = self
            .encounters
            .resolve(encounter.kind, resolution, &mut self.evolution);

        let importance = if outcome.success {
            Importance::Significant
        } else {
            Importance::Minor
        };
        let verb = if outcome.success { "overcame" } else { "failed against" };
        self.memory.record(
            importance,
            MemoryContent::Creature {
                manifestation: encounter.kind,
                summary: format!("The player {verb} {}", encounter.description),
                danger: encounter.danger,
            },
        );

        outcome
    }

    /// Switch the character to an unlocked class.
    pub fn change_class(&mut self, target: &str) -> bool {
        self.evolution.change_class(target)
    }

    // =========================================================================
    // Pipeline Stages
    // =========================================================================

    async fn narrate(
        &self,
        state: &GameState,
        scene: &Scene,
        action: &str,
        context: &str,
    ) -> NarrativeOutput {
        let request = self.build_request(scene, action, context);

        let result = match timeout(self.config.generation_timeout, self.source.generate(&request))
            .await
        {
            Ok(inner) => inner,
            Err(_) => Err(GenerationError::Timeout),
        };

        match result {
            Ok(text) => NarrativeOutput::parse(&text),
            Err(error) => {
                warn!(
                    character = %state.character_id,
                    %error,
                    "narration failed, using neutral fallback"
                );
                NarrativeOutput::fallback()
            }
        }
    }

    fn build_request(&self, scene: &Scene, action: &str, context: &str) -> GenerationRequest {
        let mut system = String::new();
        system.push_str(include_str!("prompts/world_rules.txt"));
        system.push('\n');
        system.push_str(&self.persona.prompt_block());
        system.push('\n');
        system.push_str(include_str!("prompts/narration_format.txt"));

        let prompt = format!(
            "Scene: {location}, {time}, {weather}.\n{description}\n\n\
             {context}\n\nThe player's action: {action}\n\nNarrate what happens.",
            location = scene.location,
            time = scene.time_of_day,
            weather = scene.weather,
            description = scene.description,
        );

        let mut request = GenerationRequest::new(system, prompt)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }
        request
    }

    async fn maybe_encounter(
        &mut self,
        state: &GameState,
        scene: &Scene,
        context: &str,
        rng: &mut (impl Rng + Send),
    ) -> Option<CreatureEncounter> {
        let chance =
            self.persona.active().bias.mysterious * ENCOUNTER_BIAS_SCALE + ENCOUNTER_BASE_CHANCE;
        if rng.gen::<f64>() >= chance {
            return None;
        }

        let tier = ExperienceTier::for_level(state.level);
        let kind = roll_manifestation(tier, rng);
        debug!(kind = kind.name(), ?tier, "encounter manifested");

        let encounter = match timeout(
            self.config.generation_timeout,
            self.encounters.generate(self.source.as_ref(), kind, context),
        )
        .await
        {
            Ok(encounter) => encounter,
            Err(_) => {
                warn!(kind = kind.name(), "encounter generation timed out, using fallback");
                tables::fallback_encounter(kind)
            }
        };

        let importance = match encounter.danger {
            DangerLevel::Extreme => Importance::Major,
            DangerLevel::High => Importance::Significant,
            _ => Importance::Minor,
        };
        self.memory.add_memory(
            MemoryEntry::new(
                importance,
                MemoryContent::Creature {
                    manifestation: kind,
                    summary: encounter.description.clone(),
                    danger: encounter.danger,
                },
            )
            .with_tag(scene.location.clone()),
        );

        Some(encounter)
    }

    // =========================================================================
    // Persistence Hooks
    // =========================================================================

    /// Capture everything needed to resume this chronicle later.
    pub fn snapshot(&self) -> (MemorySnapshot, EvolutionSnapshot, String) {
        (
            self.memory.snapshot(),
            self.evolution.snapshot(),
            self.persona.active().name.to_string(),
        )
    }

    /// Restore a previously captured chronicle. Returns false when the
    /// persona name is unknown, in which case nothing changes.
    pub fn restore(
        &mut self,
        memory: MemorySnapshot,
        evolution: EvolutionSnapshot,
        persona: &str,
    ) -> bool {
        let Some(profile) = profile_by_name(persona) else {
            warn!(persona, "unknown persona in save, refusing restore");
            return false;
        };
        self.memory = MemoryStore::from_snapshot(memory);
        self.evolution = EvolutionTracker::from_snapshot(evolution);
        self.persona = PersonaManager::with_profile(profile);
        true
    }
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("config", &self.config)
            .field("persona", &self.persona.active().name)
            .field("memories", &self.memory.len())
            .field("class", &self.evolution.current_class())
            .finish_non_exhaustive()
    }
}

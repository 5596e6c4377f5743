//! Narrative orchestration engine for a persistent supernatural chronicle.
//!
//! `veil-core` turns player actions into narration, remembers what happened,
//! decides when the uncanny intrudes, and tracks how the character changes
//! because of it. The host owns the UI and the save files; this crate owns
//! the story.
//!
//! The pieces:
//!
//! - [`narrator::Narrator`] orchestrates everything. Its
//!   [`process_action`](narrator::Narrator::process_action) never fails:
//!   generation problems degrade to fixed neutral narration.
//! - [`memory::MemoryStore`] is the bounded world memory: events, NPCs, and
//!   locations, with importance-weighted eviction.
//! - [`persona`] holds the narrator's personality catalog and the rules by
//!   which it adapts to how the player plays.
//! - [`encounter`] rolls, generates, and resolves supernatural encounters.
//! - [`evolution::EvolutionTracker`] records encounter outcomes and unlocks
//!   classes from proven experience.
//! - [`generation::TextSource`] is the seam to the text-generation service;
//!   [`testing::ScriptedSource`] replaces it in tests.
//!
//! # Quick start
//!
//! ```no_run
//! use veil_core::generation::OracleSource;
//! use veil_core::narrator::Narrator;
//! use veil_core::state::{GameState, Scene};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = OracleSource::from_env()?;
//! let mut narrator = Narrator::new("pc-1", Box::new(source));
//!
//! let state = GameState::new("pc-1")
//!     .with_level(3)
//!     .with_attribute("perception", 8)
//!     .with_attribute("willpower", 7);
//! let scene = Scene {
//!     location: "old-mill".to_string(),
//!     time_of_day: "dusk".to_string(),
//!     weather: "low fog".to_string(),
//!     description: "The mill wheel turns though the race ran dry.".to_string(),
//!     choices: Vec::new(),
//! };
//!
//! let outcome = narrator
//!     .process_action(&state, &scene, "listen at the broken door", None)
//!     .await;
//! println!("{}", outcome.narration);
//! if let Some(encounter) = &outcome.encounter {
//!     println!("Something is here: {}", encounter.description);
//! }
//! # Ok(())
//! # }
//! ```

pub mod encounter;
pub mod evolution;
pub mod generation;
pub mod memory;
pub mod narrator;
pub mod persist;
pub mod persona;
pub mod state;
pub mod taxonomy;
pub mod testing;

pub use encounter::{CreatureEncounter, EncounterEngine, Resolution, ResolutionOutcome};
pub use evolution::{EvolutionSnapshot, EvolutionTracker};
pub use generation::{GenerationError, GenerationRequest, OracleSource, TextSource};
pub use memory::{Importance, MemoryContent, MemoryEntry, MemorySnapshot, MemoryStore};
pub use narrator::{ActionOutcome, Narrator, NarratorConfig};
pub use persist::{PersistError, SavedChronicle, SAVE_VERSION};
pub use persona::{PersonaManager, Personality};
pub use state::{GameState, Scene, SceneChoice};
pub use taxonomy::{DangerLevel, ManifestationKind};

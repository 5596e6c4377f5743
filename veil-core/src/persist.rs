//! Versioned save format for a chronicle.
//!
//! The engine does no file IO of its own. Hosts serialize a
//! [`SavedChronicle`] to JSON and store it wherever they like; on load the
//! version is checked before anything is rebuilt.

use crate::evolution::EvolutionSnapshot;
use crate::memory::MemorySnapshot;
use crate::narrator::Narrator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current save format version. Bump on any incompatible change.
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("save names unknown narrator persona {0:?}")]
    UnknownPersona(String),
}

/// Everything needed to resume a chronicle: memory, progression, and the
/// active narrator persona, stamped with a format version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedChronicle {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub memory: MemorySnapshot,
    pub evolution: EvolutionSnapshot,
    pub persona: String,
}

impl SavedChronicle {
    /// Capture the narrator's current state.
    pub fn capture(narrator: &Narrator) -> Self {
        let (memory, evolution, persona) = narrator.snapshot();
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            memory,
            evolution,
            persona,
        }
    }

    /// Apply this save to a narrator. The narrator is untouched on error.
    pub fn apply(self, narrator: &mut Narrator) -> Result<(), PersistError> {
        if self.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }
        let persona = self.persona.clone();
        if !narrator.restore(self.memory, self.evolution, &persona) {
            return Err(PersistError::UnknownPersona(persona));
        }
        Ok(())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON, checking the format version.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let saved: SavedChronicle = serde_json::from_str(json)?;
        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }
        Ok(saved)
    }
}

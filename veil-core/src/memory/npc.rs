//! Per-NPC memory records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attitude values are clamped to this range.
pub const ATTITUDE_MIN: i32 = -100;
pub const ATTITUDE_MAX: i32 = 100;

/// Broad health tiers for NPC status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthTier {
    #[default]
    Healthy,
    Wounded,
    Critical,
    Dead,
}

/// What the NPC is currently doing and where.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpcStatus {
    /// Location identifier, if known.
    pub location: Option<String>,
    /// Health tier.
    pub health: HealthTier,
    /// Current mood descriptor.
    pub mood: String,
    /// Current activity descriptor.
    pub activity: String,
}

/// Relationship id-sets for an NPC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpcRelationships {
    pub allies: BTreeSet<String>,
    pub enemies: BTreeSet<String>,
    pub family: BTreeSet<String>,
    pub organizations: BTreeSet<String>,
}

/// Memory of a single NPC: created on first interaction, updated by every
/// interaction, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcMemory {
    /// Personality trait descriptors.
    pub traits: Vec<String>,

    /// Attitude toward each player, clamped to [-100, 100].
    pub attitudes: BTreeMap<String, i32>,

    /// Known relationships.
    pub relationships: NpcRelationships,

    /// When the player first met this NPC.
    pub first_encounter: DateTime<Utc>,

    /// When the player last interacted with this NPC.
    pub last_interaction: DateTime<Utc>,

    /// Current status.
    pub status: NpcStatus,
}

impl NpcMemory {
    /// Create a fresh record; both timestamps start at now.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            traits: Vec::new(),
            attitudes: BTreeMap::new(),
            relationships: NpcRelationships::default(),
            first_encounter: now,
            last_interaction: now,
            status: NpcStatus::default(),
        }
    }

    /// Record an interaction, refreshing `last_interaction`.
    pub fn touch(&mut self) {
        self.last_interaction = Utc::now();
    }

    /// Adjust attitude toward a player by `delta`, clamped to
    /// [`ATTITUDE_MIN`, `ATTITUDE_MAX`]. Returns the new value.
    pub fn adjust_attitude(&mut self, player_id: &str, delta: i32) -> i32 {
        let entry = self.attitudes.entry(player_id.to_string()).or_insert(0);
        *entry = entry.saturating_add(delta).clamp(ATTITUDE_MIN, ATTITUDE_MAX);
        *entry
    }

    /// Current attitude toward a player (0 when never recorded).
    pub fn attitude(&self, player_id: &str) -> i32 {
        self.attitudes.get(player_id).copied().unwrap_or(0)
    }
}

impl Default for NpcMemory {
    fn default() -> Self {
        Self::new()
    }
}

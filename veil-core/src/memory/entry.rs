//! Memory entries for the narrative store.

use crate::taxonomy::{DangerLevel, ManifestationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new unique entry ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// What kind of thing a memory entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Something that happened in the world.
    Event,
    /// A note about an NPC.
    Npc,
    /// A note about a location.
    Location,
    /// Quest progress or status.
    Quest,
    /// An action the player took.
    PlayerAction,
    /// A supernatural manifestation.
    Creature,
}

/// How strongly the store should hold on to an entry.
///
/// `Major` and `Legendary` entries are never auto-evicted and are always
/// eligible for relevance queries regardless of tag match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Trivial,
    Minor,
    Significant,
    Major,
    Legendary,
}

impl Importance {
    /// Ranking weight used for eviction order and relevance scoring.
    pub fn weight(&self) -> u32 {
        match self {
            Importance::Trivial => 1,
            Importance::Minor => 2,
            Importance::Significant => 5,
            Importance::Major => 10,
            Importance::Legendary => 20,
        }
    }

    /// Whether the store may evict entries of this importance to stay
    /// under its cap.
    pub fn is_evictable(&self) -> bool {
        !matches!(self, Importance::Major | Importance::Legendary)
    }
}

/// The typed payload of a memory entry, one variant per consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryContent {
    Event {
        description: String,
    },
    Npc {
        npc_id: String,
        note: String,
    },
    Location {
        location_id: String,
        note: String,
    },
    Quest {
        quest_id: String,
        status: String,
    },
    PlayerAction {
        action: String,
        location_id: String,
    },
    Creature {
        manifestation: ManifestationKind,
        summary: String,
        danger: DangerLevel,
    },
}

impl MemoryContent {
    /// The memory kind this payload belongs under.
    pub fn kind(&self) -> MemoryKind {
        match self {
            MemoryContent::Event { .. } => MemoryKind::Event,
            MemoryContent::Npc { .. } => MemoryKind::Npc,
            MemoryContent::Location { .. } => MemoryKind::Location,
            MemoryContent::Quest { .. } => MemoryKind::Quest,
            MemoryContent::PlayerAction { .. } => MemoryKind::PlayerAction,
            MemoryContent::Creature { .. } => MemoryKind::Creature,
        }
    }

    /// One-line rendering for context digests.
    pub fn digest_line(&self) -> String {
        match self {
            MemoryContent::Event { description } => description.clone(),
            MemoryContent::Npc { npc_id, note } => format!("{npc_id}: {note}"),
            MemoryContent::Location { location_id, note } => format!("{location_id}: {note}"),
            MemoryContent::Quest { quest_id, status } => format!("{quest_id}: {status}"),
            MemoryContent::PlayerAction {
                action,
                location_id,
            } => format!("At {location_id}, the player {action}"),
            MemoryContent::Creature {
                summary, danger, ..
            } => format!("{summary} (danger: {})", danger.name()),
        }
    }
}

/// A single record in the narrative memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique identifier, assigned on insertion.
    pub id: EntryId,
    /// What kind of record this is (derived from `content`).
    pub kind: MemoryKind,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// How strongly the store holds on to it.
    pub importance: Importance,
    /// Typed payload.
    pub content: MemoryContent,
    /// Free-form tags used for relevance matching.
    pub tags: BTreeSet<String>,
    /// Other entries this one is connected to.
    pub connections: BTreeSet<EntryId>,
    /// Narrative consequences hanging off this entry.
    pub consequences: Vec<String>,
}

impl MemoryEntry {
    /// Build an entry (id and timestamp are assigned here; the store
    /// treats both as final).
    pub fn new(importance: Importance, content: MemoryContent) -> Self {
        Self {
            id: EntryId::new(),
            kind: content.kind(),
            timestamp: Utc::now(),
            importance,
            content,
            tags: BTreeSet::new(),
            connections: BTreeSet::new(),
            consequences: Vec::new(),
        }
    }

    /// Add a tag (builder style).
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Connect this entry to another (builder style).
    pub fn with_connection(mut self, other: EntryId) -> Self {
        self.connections.insert(other);
        self
    }

    /// Append a consequence (builder style).
    pub fn with_consequence(mut self, consequence: impl Into<String>) -> Self {
        self.consequences.push(consequence.into());
        self
    }

    /// Whether any of the given tags match this entry's tags.
    pub fn matches_tags(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }

    /// Relevance score: importance weight plus whole days since the entry
    /// was recorded, so long-standing significant memories surface.
    pub fn relevance_score(&self, now: DateTime<Utc>) -> i64 {
        let days = (now - self.timestamp).num_days().max(0);
        self.importance.weight() as i64 + days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_kind_follows_content() {
        let entry = MemoryEntry::new(
            Importance::Minor,
            MemoryContent::Event {
                description: "The mill burned down.".to_string(),
            },
        );
        assert_eq!(entry.kind, MemoryKind::Event);

        let entry = MemoryEntry::new(
            Importance::Major,
            MemoryContent::Creature {
                manifestation: ManifestationKind::Revenant,
                summary: "Something walked the old road.".to_string(),
                danger: DangerLevel::High,
            },
        );
        assert_eq!(entry.kind, MemoryKind::Creature);
    }

    #[test]
    fn test_tag_matching() {
        let entry = MemoryEntry::new(
            Importance::Minor,
            MemoryContent::Event {
                description: "x".to_string(),
            },
        )
        .with_tag("old-mill")
        .with_tag("fire");

        assert!(entry.matches_tags(&["fire".to_string()]));
        assert!(!entry.matches_tags(&["river".to_string()]));
        assert!(!entry.matches_tags(&[]));
    }

    #[test]
    fn test_relevance_score_grows_with_age() {
        let mut entry = MemoryEntry::new(
            Importance::Significant,
            MemoryContent::Event {
                description: "x".to_string(),
            },
        );
        let now = entry.timestamp;
        assert_eq!(entry.relevance_score(now), 5);

        entry.timestamp = now - Duration::days(3);
        assert_eq!(entry.relevance_score(now), 8);
    }

    #[test]
    fn test_evictability() {
        assert!(Importance::Trivial.is_evictable());
        assert!(Importance::Significant.is_evictable());
        assert!(!Importance::Major.is_evictable());
        assert!(!Importance::Legendary.is_evictable());
    }
}

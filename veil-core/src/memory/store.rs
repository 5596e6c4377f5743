//! The bounded, importance-ranked narrative memory store.

use super::entry::{EntryId, Importance, MemoryContent, MemoryEntry, MemoryKind};
use super::location::LocationMemory;
use super::npc::NpcMemory;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Maximum number of entries the store holds before evicting.
pub const MEMORY_CAP: usize = 1000;

/// How many entries an eviction pass removes.
const EVICT_BATCH: usize = MEMORY_CAP / 10;

/// How many recent world events a narrative context includes.
const CONTEXT_EVENTS: usize = 3;

/// How many tag-relevant memories a narrative context includes.
const CONTEXT_MEMORIES: usize = 5;

/// The narrative memory store: world events, NPC dispositions, and location
/// state for one session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<EntryId, MemoryEntry>,
    npcs: HashMap<String, NpcMemory>,
    locations: HashMap<String, LocationMemory>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Entry Management
    // =========================================================================

    /// Insert an entry, assigning its id, and evict if over the cap.
    ///
    /// Eviction removes a batch of the lowest-ranked evictable entries
    /// (importance weight ascending, then oldest first), so `Trivial` and
    /// oldest go first. `Major` and `Legendary` entries are never evicted
    /// automatically; if the store is saturated with them it may exceed the
    /// cap rather than drop one.
    pub fn add_memory(&mut self, entry: MemoryEntry) -> EntryId {
        let id = entry.id;
        self.entries.insert(id, entry);

        if self.entries.len() > MEMORY_CAP {
            self.evict();
        }

        id
    }

    /// Convenience: build and insert an entry in one call.
    pub fn record(&mut self, importance: Importance, content: MemoryContent) -> EntryId {
        self.add_memory(MemoryEntry::new(importance, content))
    }

    /// Get an entry by id.
    pub fn get(&self, id: EntryId) -> Option<&MemoryEntry> {
        self.entries.get(&id)
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict(&mut self) {
        let mut candidates: Vec<(EntryId, u32, chrono::DateTime<Utc>)> = self
            .entries
            .values()
            .filter(|e| e.importance.is_evictable())
            .map(|e| (e.id, e.importance.weight(), e.timestamp))
            .collect();

        candidates.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.cmp(&b.2)));

        let evicted = candidates.len().min(EVICT_BATCH);
        for (id, _, _) in candidates.into_iter().take(EVICT_BATCH) {
            self.entries.remove(&id);
        }

        debug!(evicted, remaining = self.entries.len(), "memory eviction pass");
    }

    /// Memories relevant to the given tags, highest score first.
    ///
    /// Score is importance weight plus whole days of age. `Major` and
    /// `Legendary` entries are always eligible regardless of tag match.
    pub fn relevant_memories(&self, tags: &[String], limit: usize) -> Vec<&MemoryEntry> {
        let now = Utc::now();
        let mut matches: Vec<&MemoryEntry> = self
            .entries
            .values()
            .filter(|e| !e.importance.is_evictable() || e.matches_tags(tags))
            .collect();

        matches.sort_by_key(|e| std::cmp::Reverse(e.relevance_score(now)));
        matches.truncate(limit);
        matches
    }

    /// Memories of a given kind, newest first.
    pub fn memories_by_kind(&self, kind: MemoryKind, limit: usize) -> Vec<&MemoryEntry> {
        let mut matches: Vec<&MemoryEntry> =
            self.entries.values().filter(|e| e.kind == kind).collect();

        matches.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
        matches.truncate(limit);
        matches
    }

    // =========================================================================
    // NPC Management
    // =========================================================================

    /// Get or create the record for an NPC, refreshing its last-interaction
    /// timestamp. NPC records are never deleted.
    pub fn npc_entry(&mut self, npc_id: &str) -> &mut NpcMemory {
        let npc = self
            .npcs
            .entry(npc_id.to_string())
            .or_insert_with(NpcMemory::new);
        npc.touch();
        npc
    }

    /// Read-only view of an NPC record, if one exists.
    pub fn npc(&self, npc_id: &str) -> Option<&NpcMemory> {
        self.npcs.get(npc_id)
    }

    /// Adjust an NPC's attitude toward a player, clamped to [-100, 100].
    /// Creates the NPC record on first contact. Returns the new attitude.
    pub fn update_npc_attitude(&mut self, npc_id: &str, player_id: &str, delta: i32) -> i32 {
        self.npc_entry(npc_id).adjust_attitude(player_id, delta)
    }

    /// Number of NPCs tracked.
    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    // =========================================================================
    // Location Management
    // =========================================================================

    /// Get or create the record for a location, **registering a visit**.
    ///
    /// Reading a location's memory deliberately bumps its visit counter and
    /// `last_visited`; visit counts are usage data the rest of the system
    /// displays, so this read is intentionally not idempotent. Use
    /// [`MemoryStore::peek_location`] for a pure view.
    pub fn location_memory(&mut self, location_id: &str) -> &LocationMemory {
        let location = self
            .locations
            .entry(location_id.to_string())
            .or_insert_with(LocationMemory::new);
        location.register_visit();
        location
    }

    /// Pure view of a location record, if one exists. Does not count as a
    /// visit.
    pub fn peek_location(&self, location_id: &str) -> Option<&LocationMemory> {
        self.locations.get(location_id)
    }

    /// Mutable access for updates that are not reads (presence shifts,
    /// resident changes, significant events).
    pub fn location_entry(&mut self, location_id: &str) -> &mut LocationMemory {
        self.locations
            .entry(location_id.to_string())
            .or_insert_with(LocationMemory::new)
    }

    /// Number of locations tracked.
    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    // =========================================================================
    // Context Building
    // =========================================================================

    /// Produce the textual digest handed verbatim to the generation service:
    /// the location's current state (a counting read), up to three recent
    /// world events, and up to five tag-relevant memories.
    pub fn narrative_context(&mut self, location_id: &str, player_id: &str) -> String {
        let mut context = String::new();

        // Location state first; this read registers a visit.
        let location = self.location_memory(location_id);
        context.push_str("## Current Location\n");
        context.push_str(&format!(
            "{location_id} feels {} (presence {}), visited {} time(s).\n",
            location.presence_descriptor(),
            location.supernatural_presence(),
            location.visit_count,
        ));
        if !location.atmosphere.is_empty() {
            context.push_str(&format!("Atmosphere: {}.\n", location.atmosphere));
        }
        if !location.resident_npcs.is_empty() {
            let residents: Vec<_> = location.resident_npcs.iter().cloned().collect();
            context.push_str(&format!("Known residents: {}.\n", residents.join(", ")));
        }
        if let Some(event) = location.significant_events.last() {
            context.push_str(&format!("Most recent event here: {event}\n"));
        }

        let events = self.memories_by_kind(MemoryKind::Event, CONTEXT_EVENTS);
        if !events.is_empty() {
            context.push_str("\n## Recent World Events\n");
            for event in events {
                context.push_str(&format!("- {}\n", event.content.digest_line()));
            }
        }

        let tags = vec![location_id.to_string(), player_id.to_string()];
        let relevant = self.relevant_memories(&tags, CONTEXT_MEMORIES);
        if !relevant.is_empty() {
            context.push_str("\n## Relevant Memories\n");
            for memory in relevant {
                context.push_str(&format!("- {}\n", memory.content.digest_line()));
            }
        }

        context
    }

    // =========================================================================
    // Serialization Hooks
    // =========================================================================

    /// Produce a self-contained snapshot for external persistence. Maps are
    /// flattened to entry lists; timestamps serialize as ISO-8601.
    pub fn snapshot(&self) -> MemorySnapshot {
        let mut entries: Vec<MemoryEntry> = self.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.timestamp);

        let mut npcs: Vec<(String, NpcMemory)> = self
            .npcs
            .iter()
            .map(|(id, npc)| (id.clone(), npc.clone()))
            .collect();
        npcs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut locations: Vec<(String, LocationMemory)> = self
            .locations
            .iter()
            .map(|(id, location)| (id.clone(), location.clone()))
            .collect();
        locations.sort_by(|a, b| a.0.cmp(&b.0));

        MemorySnapshot {
            entries,
            npcs,
            locations,
        }
    }

    /// Rebuild a store from a snapshot.
    pub fn from_snapshot(snapshot: MemorySnapshot) -> Self {
        Self {
            entries: snapshot.entries.into_iter().map(|e| (e.id, e)).collect(),
            npcs: snapshot.npcs.into_iter().collect(),
            locations: snapshot.locations.into_iter().collect(),
        }
    }
}

/// Self-contained, serializable image of a [`MemoryStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub entries: Vec<MemoryEntry>,
    pub npcs: Vec<(String, NpcMemory)>,
    pub locations: Vec<(String, LocationMemory)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trivial_event(n: usize) -> MemoryEntry {
        MemoryEntry::new(
            Importance::Trivial,
            MemoryContent::Event {
                description: format!("minor happening {n}"),
            },
        )
    }

    #[test]
    fn test_cap_enforced() {
        let mut store = MemoryStore::new();
        for n in 0..(MEMORY_CAP + 50) {
            store.record(
                Importance::Trivial,
                MemoryContent::Event {
                    description: format!("event {n}"),
                },
            );
        }
        assert!(store.len() <= MEMORY_CAP);
    }

    #[test]
    fn test_protected_entries_survive_eviction() {
        let mut store = MemoryStore::new();

        let legendary = store.record(
            Importance::Legendary,
            MemoryContent::Event {
                description: "The night the stars went out.".to_string(),
            },
        );
        let major = store.record(
            Importance::Major,
            MemoryContent::Event {
                description: "The baron's pact.".to_string(),
            },
        );

        for n in 0..(MEMORY_CAP + 100) {
            store.add_memory(trivial_event(n));
        }

        assert!(store.get(legendary).is_some());
        assert!(store.get(major).is_some());
        assert!(store.len() <= MEMORY_CAP);
    }

    #[test]
    fn test_relevant_memories_tag_filter() {
        let mut store = MemoryStore::new();

        store.add_memory(
            MemoryEntry::new(
                Importance::Minor,
                MemoryContent::Event {
                    description: "A fire at the mill.".to_string(),
                },
            )
            .with_tag("old-mill"),
        );
        store.add_memory(
            MemoryEntry::new(
                Importance::Minor,
                MemoryContent::Event {
                    description: "A wedding in the square.".to_string(),
                },
            )
            .with_tag("town-square"),
        );
        // Legendary entries surface regardless of tags.
        store.record(
            Importance::Legendary,
            MemoryContent::Event {
                description: "The comet that would not set.".to_string(),
            },
        );

        let relevant = store.relevant_memories(&["old-mill".to_string()], 10);
        assert_eq!(relevant.len(), 2);
        assert!(relevant
            .iter()
            .any(|e| e.content.digest_line().contains("comet")));
        assert!(!relevant
            .iter()
            .any(|e| e.content.digest_line().contains("wedding")));
    }

    #[test]
    fn test_memories_by_kind_newest_first() {
        let mut store = MemoryStore::new();
        let mut old = trivial_event(0);
        old.timestamp = Utc::now() - chrono::Duration::days(2);
        store.add_memory(old);
        store.add_memory(trivial_event(1));

        let events = store.memories_by_kind(MemoryKind::Event, 10);
        assert_eq!(events.len(), 2);
        assert!(events[0].timestamp >= events[1].timestamp);

        assert!(store.memories_by_kind(MemoryKind::Creature, 10).is_empty());
    }

    #[test]
    fn test_npc_created_on_first_contact() {
        let mut store = MemoryStore::new();
        assert!(store.npc("ferryman").is_none());

        let attitude = store.update_npc_attitude("ferryman", "pc-1", -15);
        assert_eq!(attitude, -15);
        assert_eq!(store.npc_count(), 1);
        assert!(store.npc("ferryman").is_some());
    }

    #[test]
    fn test_location_read_counts_visits() {
        let mut store = MemoryStore::new();

        store.location_memory("chapel");
        store.location_memory("chapel");
        let chapel = store.location_memory("chapel");
        assert_eq!(chapel.visit_count, 3);

        // peek does not count.
        let _ = store.peek_location("chapel");
        assert_eq!(store.peek_location("chapel").unwrap().visit_count, 3);
    }

    #[test]
    fn test_narrative_context_contents() {
        let mut store = MemoryStore::new();

        store.location_entry("chapel").adjust_presence(70);
        store.location_entry("chapel").record_event("The font froze in summer.");
        store.record(
            Importance::Minor,
            MemoryContent::Event {
                description: "Bells rang with no ringer.".to_string(),
            },
        );
        store.add_memory(
            MemoryEntry::new(
                Importance::Significant,
                MemoryContent::Npc {
                    npc_id: "sexton".to_string(),
                    note: "keeps salt in every pocket".to_string(),
                },
            )
            .with_tag("chapel"),
        );

        let context = store.narrative_context("chapel", "pc-1");
        assert!(context.contains("## Current Location"));
        assert!(context.contains("haunted"));
        assert!(context.contains("font froze"));
        assert!(context.contains("Bells rang"));
        assert!(context.contains("salt in every pocket"));

        // The context build itself registered a visit.
        assert_eq!(store.peek_location("chapel").unwrap().visit_count, 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut store = MemoryStore::new();
        let id = store.record(
            Importance::Major,
            MemoryContent::Event {
                description: "The pact.".to_string(),
            },
        );
        store.update_npc_attitude("ferryman", "pc-1", 12);
        store.location_entry("chapel").adjust_presence(33);

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let restored = MemoryStore::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.len(), 1);
        assert!(restored.get(id).is_some());
        assert_eq!(restored.npc("ferryman").unwrap().attitude("pc-1"), 12);
        assert_eq!(
            restored.peek_location("chapel").unwrap().supernatural_presence(),
            33
        );
    }
}

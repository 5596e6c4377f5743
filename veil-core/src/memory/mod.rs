//! Narrative memory: a bounded, importance-ranked record of world events,
//! NPC dispositions, and location state.
//!
//! The store supplies contextual digests to every generation request and is
//! the single place session history accumulates. It is owned by one
//! [`Narrator`](crate::narrator::Narrator) and mutated only through it.

mod entry;
mod location;
mod npc;
mod store;

pub use entry::{EntryId, Importance, MemoryContent, MemoryEntry, MemoryKind};
pub use location::{LocationMemory, PRESENCE_MAX, PRESENCE_MIN};
pub use npc::{HealthTier, NpcMemory, NpcRelationships, NpcStatus, ATTITUDE_MAX, ATTITUDE_MIN};
pub use store::{MemorySnapshot, MemoryStore, MEMORY_CAP};

//! Per-location memory records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Supernatural presence is clamped to this range.
pub const PRESENCE_MIN: i32 = 0;
pub const PRESENCE_MAX: i32 = 100;

/// Memory of a single location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationMemory {
    /// How saturated with the supernatural this place is, 0..=100.
    supernatural_presence: i32,

    /// Append-only record of significant events here.
    pub significant_events: Vec<String>,

    /// NPCs known to reside here.
    pub resident_npcs: BTreeSet<String>,

    /// Atmosphere tag ("hushed", "sour", "watchful", ...).
    pub atmosphere: String,

    /// How many times this location's memory has been read.
    pub visit_count: u32,

    /// When the location was last visited (last read).
    pub last_visited: Option<DateTime<Utc>>,
}

impl LocationMemory {
    /// Create a fresh record with no presence and no history.
    pub fn new() -> Self {
        Self {
            supernatural_presence: 0,
            significant_events: Vec::new(),
            resident_npcs: BTreeSet::new(),
            atmosphere: String::new(),
            visit_count: 0,
            last_visited: None,
        }
    }

    /// Current supernatural presence.
    pub fn supernatural_presence(&self) -> i32 {
        self.supernatural_presence
    }

    /// Adjust supernatural presence by `delta`, clamped to
    /// [`PRESENCE_MIN`, `PRESENCE_MAX`]. Returns the new value.
    pub fn adjust_presence(&mut self, delta: i32) -> i32 {
        self.supernatural_presence = self
            .supernatural_presence
            .saturating_add(delta)
            .clamp(PRESENCE_MIN, PRESENCE_MAX);
        self.supernatural_presence
    }

    /// Append a significant event. The list is append-only.
    pub fn record_event(&mut self, event: impl Into<String>) {
        self.significant_events.push(event.into());
    }

    /// Register a visit: bump the counter and refresh `last_visited`.
    pub fn register_visit(&mut self) {
        self.visit_count += 1;
        self.last_visited = Some(Utc::now());
    }

    /// Short descriptor of how haunted this place feels, for digests.
    pub fn presence_descriptor(&self) -> &'static str {
        match self.supernatural_presence {
            0..=9 => "quiet",
            10..=29 => "uneasy",
            30..=59 => "restless",
            60..=84 => "haunted",
            _ => "saturated",
        }
    }
}

impl Default for LocationMemory {
    fn default() -> Self {
        Self::new()
    }
}

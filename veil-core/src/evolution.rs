//! Per-character progression: encounter outcomes, class unlocks, and
//! additive attribute composition.

use crate::taxonomy::ManifestationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Evolution points granted for a successful encounter.
const SUCCESS_POINTS: u32 = 10;

/// Evolution points granted for a failed encounter. Failure still teaches.
const FAILURE_POINTS: u32 = 5;

/// Spiritual awakening gained on success / failure, capped at
/// [`AWAKENING_CAP`].
const AWAKENING_SUCCESS: u32 = 2;
const AWAKENING_FAILURE: u32 = 1;
const AWAKENING_CAP: u32 = 100;

/// Mastery gained per class change, capped at [`MASTERY_CAP`].
const MASTERY_STEP: u32 = 10;
const MASTERY_CAP: u32 = 100;

/// The class every character starts with.
pub const DEFAULT_CLASS: &str = "Wanderer";

/// Fixed attribute bonuses for a class. Unknown classes grant nothing.
pub fn class_bonus(class: &str) -> &'static [(&'static str, i32)] {
    match class {
        "Facekeeper" => &[("perception", 2), ("empathy", 2)],
        "Threshold Warden" => &[("perception", 2), ("willpower", 2)],
        "Sin Eater" => &[("willpower", 2), ("endurance", 2)],
        "Hedge Bargainer" => &[("cunning", 2), ("empathy", 2)],
        "Gravewarden" => &[("willpower", 2), ("empathy", 2)],
        "Stillheart" => &[("willpower", 2), ("perception", 2)],
        "Greenfriend" => &[("cunning", 2), ("agility", 2)],
        "Curio Binder" => &[("cunning", 2), ("perception", 2)],
        _ => &[],
    }
}

/// Per-kind ledger of encounter outcomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncounterRecord {
    pub encounter_count: u32,
    pub successful_encounters: u32,
    pub failed_encounters: u32,
    pub learned_lessons: Vec<String>,
    pub granted_powers: Vec<String>,
}

/// One entry in the evolution history, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionEvent {
    pub date: DateTime<Utc>,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_change: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attribute_changes: BTreeMap<String, i32>,
}

impl EvolutionEvent {
    fn new(event: impl Into<String>) -> Self {
        Self {
            date: Utc::now(),
            event: event.into(),
            class_change: None,
            attribute_changes: BTreeMap::new(),
        }
    }
}

/// The progression ledger for one character.
#[derive(Debug, Clone)]
pub struct EvolutionTracker {
    character_id: String,
    current_class: String,
    available_classes: BTreeSet<String>,
    class_mastery: BTreeMap<String, u32>,
    encounters: BTreeMap<ManifestationKind, EncounterRecord>,
    evolution_points: u32,
    spiritual_awakening: u32,
    history: Vec<EvolutionEvent>,
}

impl EvolutionTracker {
    /// Create a fresh tracker; the default class is always available.
    pub fn new(character_id: impl Into<String>) -> Self {
        let mut available_classes = BTreeSet::new();
        available_classes.insert(DEFAULT_CLASS.to_string());
        let mut class_mastery = BTreeMap::new();
        class_mastery.insert(DEFAULT_CLASS.to_string(), 0);

        Self {
            character_id: character_id.into(),
            current_class: DEFAULT_CLASS.to_string(),
            available_classes,
            class_mastery,
            encounters: BTreeMap::new(),
            evolution_points: 0,
            spiritual_awakening: 0,
            history: Vec::new(),
        }
    }

    /// The character this ledger belongs to.
    pub fn character_id(&self) -> &str {
        &self.character_id
    }

    /// The class currently held.
    pub fn current_class(&self) -> &str {
        &self.current_class
    }

    /// Classes unlocked so far. The set only grows.
    pub fn available_classes(&self) -> &BTreeSet<String> {
        &self.available_classes
    }

    /// Mastery of a class, 0 when never held.
    pub fn mastery(&self, class: &str) -> u32 {
        self.class_mastery.get(class).copied().unwrap_or(0)
    }

    /// Accumulated evolution points. Monotonic.
    pub fn evolution_points(&self) -> u32 {
        self.evolution_points
    }

    /// Accumulated exposure to the supernatural, 0..=100.
    pub fn spiritual_awakening(&self) -> u32 {
        self.spiritual_awakening
    }

    /// The per-kind ledger, if this kind was ever encountered.
    pub fn encounter_record(&self, kind: ManifestationKind) -> Option<&EncounterRecord> {
        self.encounters.get(&kind)
    }

    /// The append-only evolution history.
    pub fn history(&self) -> &[EvolutionEvent] {
        &self.history
    }

    /// Record the outcome of a creature encounter. Success earns more
    /// points and awakening than failure, but both earn something. Returns
    /// the class this outcome newly unlocked, if any.
    pub fn record_creature_encounter(
        &mut self,
        kind: ManifestationKind,
        success: bool,
        lesson: Option<String>,
        granted_power: Option<String>,
    ) -> Option<String> {
        let record = self.encounters.entry(kind).or_default();
        record.encounter_count += 1;

        if success {
            record.successful_encounters += 1;
            self.evolution_points += SUCCESS_POINTS;
            if let Some(lesson) = lesson {
                record.learned_lessons.push(lesson);
            }
            if let Some(power) = granted_power {
                record.granted_powers.push(power);
            }
        } else {
            record.failed_encounters += 1;
            self.evolution_points += FAILURE_POINTS;
        }

        let gain = if success {
            AWAKENING_SUCCESS
        } else {
            AWAKENING_FAILURE
        };
        self.spiritual_awakening = (self.spiritual_awakening + gain).min(AWAKENING_CAP);

        self.check_class_unlock(kind)
    }

    /// Compare the kind's success count against its unlock threshold and
    /// unlock the associated class if met. Idempotent: an already-unlocked
    /// class is never duplicated and no second history entry is appended.
    pub fn check_class_unlock(&mut self, kind: ManifestationKind) -> Option<String> {
        let successes = self
            .encounters
            .get(&kind)
            .map(|r| r.successful_encounters)
            .unwrap_or(0);

        if successes < kind.unlock_threshold() {
            return None;
        }

        let class = kind.unlock_class().to_string();
        if !self.available_classes.insert(class.clone()) {
            return None;
        }

        self.class_mastery.insert(class.clone(), 0);
        self.history.push(EvolutionEvent {
            class_change: None,
            ..EvolutionEvent::new(format!(
                "Unlocked the {class} path after {successes} proven encounters"
            ))
        });
        info!(
            character = %self.character_id,
            class = %class,
            "class unlocked"
        );
        Some(class)
    }

    /// Switch to an unlocked class. Returns false (and changes nothing)
    /// when the target has not been unlocked.
    pub fn change_class(&mut self, target: &str) -> bool {
        if !self.available_classes.contains(target) {
            return false;
        }

        self.current_class = target.to_string();
        let mastery = self.class_mastery.entry(target.to_string()).or_insert(0);
        *mastery = (*mastery + MASTERY_STEP).min(MASTERY_CAP);

        let mut event = EvolutionEvent::new(format!("Took up the {target} path"));
        event.class_change = Some(target.to_string());
        self.history.push(event);
        true
    }

    /// Compose total attributes from base values, the current class's fixed
    /// bonuses, and per-kind encounter bonuses (`successes / 2` on each of
    /// the kind's attribute pair, for every kind with at least one success).
    /// Pure: repeated calls over the same state give the same result.
    pub fn calculate_total_attributes(
        &self,
        base: &BTreeMap<String, i32>,
    ) -> BTreeMap<String, i32> {
        let mut totals = base.clone();

        for (attribute, bonus) in class_bonus(&self.current_class) {
            *totals.entry(attribute.to_string()).or_insert(0) += bonus;
        }

        for (kind, record) in &self.encounters {
            if record.successful_encounters == 0 {
                continue;
            }
            let bonus = (record.successful_encounters / 2) as i32;
            if bonus == 0 {
                continue;
            }
            let (first, second) = kind.attribute_pair();
            *totals.entry(first.to_string()).or_insert(0) += bonus;
            *totals.entry(second.to_string()).or_insert(0) += bonus;
        }

        totals
    }

    // =========================================================================
    // Serialization Hooks
    // =========================================================================

    /// Produce a self-contained snapshot for external persistence.
    pub fn snapshot(&self) -> EvolutionSnapshot {
        EvolutionSnapshot {
            character_id: self.character_id.clone(),
            current_class: self.current_class.clone(),
            available_classes: self.available_classes.iter().cloned().collect(),
            class_mastery: self
                .class_mastery
                .iter()
                .map(|(class, mastery)| (class.clone(), *mastery))
                .collect(),
            encounters: self
                .encounters
                .iter()
                .map(|(kind, record)| (*kind, record.clone()))
                .collect(),
            evolution_points: self.evolution_points,
            spiritual_awakening: self.spiritual_awakening,
            history: self.history.clone(),
        }
    }

    /// Rebuild a tracker from a snapshot.
    pub fn from_snapshot(snapshot: EvolutionSnapshot) -> Self {
        Self {
            character_id: snapshot.character_id,
            current_class: snapshot.current_class,
            available_classes: snapshot.available_classes.into_iter().collect(),
            class_mastery: snapshot.class_mastery.into_iter().collect(),
            encounters: snapshot.encounters.into_iter().collect(),
            evolution_points: snapshot.evolution_points,
            spiritual_awakening: snapshot.spiritual_awakening,
            history: snapshot.history,
        }
    }
}

/// Self-contained, serializable image of an [`EvolutionTracker`]. Maps are
/// flattened to entry lists; dates serialize as ISO-8601.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionSnapshot {
    pub character_id: String,
    pub current_class: String,
    pub available_classes: Vec<String>,
    pub class_mastery: Vec<(String, u32)>,
    pub encounters: Vec<(ManifestationKind, EncounterRecord)>,
    pub evolution_points: u32,
    pub spiritual_awakening: u32,
    pub history: Vec<EvolutionEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_and_awakening_accrual() {
        let mut tracker = EvolutionTracker::new("pc-1");

        tracker.record_creature_encounter(ManifestationKind::Sprite, true, None, None);
        assert_eq!(tracker.evolution_points(), 10);
        assert_eq!(tracker.spiritual_awakening(), 2);

        tracker.record_creature_encounter(ManifestationKind::Sprite, false, None, None);
        assert_eq!(tracker.evolution_points(), 15);
        assert_eq!(tracker.spiritual_awakening(), 3);
    }

    #[test]
    fn test_awakening_caps_at_100() {
        let mut tracker = EvolutionTracker::new("pc-1");
        for _ in 0..200 {
            tracker.record_creature_encounter(ManifestationKind::Vessel, true, None, None);
        }
        assert_eq!(tracker.spiritual_awakening(), 100);
    }

    #[test]
    fn test_lessons_and_powers_recorded_on_success() {
        let mut tracker = EvolutionTracker::new("pc-1");
        tracker.record_creature_encounter(
            ManifestationKind::Revenant,
            true,
            Some("The dead ask little".to_string()),
            Some("Read the rites".to_string()),
        );

        let record = tracker.encounter_record(ManifestationKind::Revenant).unwrap();
        assert_eq!(record.learned_lessons.len(), 1);
        assert_eq!(record.granted_powers.len(), 1);
    }

    #[test]
    fn test_class_unlock_at_threshold() {
        let mut tracker = EvolutionTracker::new("pc-1");
        let threshold = ManifestationKind::Sprite.unlock_threshold();

        let mut unlocked = None;
        for _ in 0..threshold {
            unlocked =
                tracker.record_creature_encounter(ManifestationKind::Sprite, true, None, None);
        }

        assert_eq!(unlocked.as_deref(), Some("Greenfriend"));
        assert!(tracker.available_classes().contains("Greenfriend"));
        assert_eq!(tracker.mastery("Greenfriend"), 0);
    }

    #[test]
    fn test_class_unlock_idempotent() {
        let mut tracker = EvolutionTracker::new("pc-1");
        for _ in 0..6 {
            tracker.record_creature_encounter(ManifestationKind::FolkSpirit, true, None, None);
        }

        // The handler firing again must not duplicate anything.
        assert!(tracker.check_class_unlock(ManifestationKind::FolkSpirit).is_none());
        assert!(tracker.check_class_unlock(ManifestationKind::FolkSpirit).is_none());

        assert_eq!(
            tracker
                .available_classes()
                .iter()
                .filter(|c| c.as_str() == "Hedge Bargainer")
                .count(),
            1
        );
        let unlock_entries = tracker
            .history()
            .iter()
            .filter(|e| e.event.contains("Hedge Bargainer"))
            .count();
        assert_eq!(unlock_entries, 1);
    }

    #[test]
    fn test_failures_never_unlock() {
        let mut tracker = EvolutionTracker::new("pc-1");
        for _ in 0..20 {
            tracker.record_creature_encounter(ManifestationKind::Sprite, false, None, None);
        }
        assert!(!tracker.available_classes().contains("Greenfriend"));
    }

    #[test]
    fn test_change_class_requires_unlock() {
        let mut tracker = EvolutionTracker::new("pc-1");

        assert!(!tracker.change_class("Gravewarden"));
        assert_eq!(tracker.current_class(), DEFAULT_CLASS);

        for _ in 0..ManifestationKind::Revenant.unlock_threshold() {
            tracker.record_creature_encounter(ManifestationKind::Revenant, true, None, None);
        }

        assert!(tracker.change_class("Gravewarden"));
        assert_eq!(tracker.current_class(), "Gravewarden");
        assert_eq!(tracker.mastery("Gravewarden"), 10);

        // Mastery steps up on each change, capped.
        for _ in 0..20 {
            tracker.change_class("Gravewarden");
        }
        assert_eq!(tracker.mastery("Gravewarden"), 100);
    }

    #[test]
    fn test_total_attributes_composition() {
        let mut tracker = EvolutionTracker::new("pc-1");

        // 6 successes against Revenant: unlocks Gravewarden and earns a
        // floor(6/2) = 3 bonus on willpower and empathy.
        for _ in 0..7 {
            tracker.record_creature_encounter(ManifestationKind::Revenant, true, None, None);
        }
        assert!(tracker.change_class("Gravewarden"));

        // 1 success against Sprite: present in the ledger but floor(1/2) = 0.
        tracker.record_creature_encounter(ManifestationKind::Sprite, true, None, None);

        let mut base = BTreeMap::new();
        base.insert("willpower".to_string(), 10);
        base.insert("empathy".to_string(), 8);

        let totals = tracker.calculate_total_attributes(&base);

        // 10 base + 2 class + 3 encounters.
        assert_eq!(totals["willpower"], 15);
        // 8 base + 2 class + 3 encounters.
        assert_eq!(totals["empathy"], 13);
        // Untouched attributes are absent rather than zeroed.
        assert!(!totals.contains_key("cunning"));

        // Pure: calling again changes nothing.
        assert_eq!(tracker.calculate_total_attributes(&base), totals);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut tracker = EvolutionTracker::new("pc-1");
        for _ in 0..4 {
            tracker.record_creature_encounter(ManifestationKind::Vessel, true, None, None);
        }
        tracker.change_class("Curio Binder");

        let json = serde_json::to_string(&tracker.snapshot()).unwrap();
        let restored = EvolutionTracker::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.character_id(), "pc-1");
        assert_eq!(restored.current_class(), "Curio Binder");
        assert_eq!(restored.evolution_points(), tracker.evolution_points());
        assert_eq!(
            restored
                .encounter_record(ManifestationKind::Vessel)
                .unwrap()
                .successful_encounters,
            4
        );
        assert_eq!(restored.history().len(), tracker.history().len());
    }
}

//! End-to-end progression: encounters resolve into points, unlocks, and
//! attribute growth.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use veil_core::encounter::{EncounterEngine, Resolution};
use veil_core::evolution::EvolutionTracker;
use veil_core::taxonomy::ManifestationKind;

/// Resolve until the outcome's success matches `want`, so tests can steer
/// without fixing the RNG stream by hand.
fn resolve_until(
    engine: &EncounterEngine,
    kind: ManifestationKind,
    resolution: Resolution,
    evolution: &mut EvolutionTracker,
    rng: &mut StdRng,
    want: bool,
) -> veil_core::encounter::ResolutionOutcome {
    loop {
        let mut probe = evolution.clone();
        let outcome = engine.resolve_with_rng(kind, resolution, &mut probe, rng);
        if outcome.success == want {
            *evolution = probe;
            return outcome;
        }
    }
}

#[test]
fn successful_resolutions_accumulate_into_an_unlock() {
    let engine = EncounterEngine::new();
    let mut evolution = EvolutionTracker::new("pc-1");
    let mut rng = StdRng::seed_from_u64(7);

    let threshold = ManifestationKind::Sprite.unlock_threshold();
    let mut unlocked = None;
    for _ in 0..threshold {
        let outcome = resolve_until(
            &engine,
            ManifestationKind::Sprite,
            Resolution::Peaceful,
            &mut evolution,
            &mut rng,
            true,
        );
        assert!(outcome.success);
        assert!(outcome.experience > 0);
        unlocked = outcome.unlocked_class;
    }

    assert_eq!(unlocked.as_deref(), Some("Greenfriend"));
    assert!(evolution.available_classes().contains("Greenfriend"));

    // The unlock fires exactly once; further successes report nothing new.
    let outcome = resolve_until(
        &engine,
        ManifestationKind::Sprite,
        Resolution::Peaceful,
        &mut evolution,
        &mut rng,
        true,
    );
    assert!(outcome.unlocked_class.is_none());
}

#[test]
fn failed_resolutions_still_teach_but_never_unlock() {
    let engine = EncounterEngine::new();
    let mut evolution = EvolutionTracker::new("pc-1");
    let mut rng = StdRng::seed_from_u64(8);

    for _ in 0..10 {
        let outcome = resolve_until(
            &engine,
            ManifestationKind::Vessel,
            Resolution::Confrontational,
            &mut evolution,
            &mut rng,
            false,
        );
        assert!(!outcome.success);
        assert!(outcome.experience > 0);
        assert!(outcome.learned_lesson.is_none());
        assert!(outcome.granted_power.is_none());
        assert!(outcome.unlocked_class.is_none());
    }

    assert_eq!(evolution.evolution_points(), 50);
    assert!(!evolution.available_classes().contains("Curio Binder"));
}

#[test]
fn observation_grants_no_power() {
    let engine = EncounterEngine::new();
    let mut evolution = EvolutionTracker::new("pc-1");
    let mut rng = StdRng::seed_from_u64(9);

    let outcome = resolve_until(
        &engine,
        ManifestationKind::Harbinger,
        Resolution::Observe,
        &mut evolution,
        &mut rng,
        true,
    );

    assert!(outcome.success);
    assert!(outcome.granted_power.is_none());
    assert!(outcome.learned_lesson.is_some());
}

#[test]
fn class_change_feeds_attribute_composition() {
    let engine = EncounterEngine::new();
    let mut evolution = EvolutionTracker::new("pc-1");
    let mut rng = StdRng::seed_from_u64(10);

    for _ in 0..ManifestationKind::FolkSpirit.unlock_threshold() {
        resolve_until(
            &engine,
            ManifestationKind::FolkSpirit,
            Resolution::Peaceful,
            &mut evolution,
            &mut rng,
            true,
        );
    }

    assert!(evolution.change_class("Hedge Bargainer"));
    assert_eq!(evolution.current_class(), "Hedge Bargainer");

    let mut base = BTreeMap::new();
    base.insert("cunning".to_string(), 6);
    base.insert("empathy".to_string(), 6);

    let totals = evolution.calculate_total_attributes(&base);

    // 6 base + 2 class bonus + floor(5/2) = 2 encounter bonus.
    assert_eq!(totals["cunning"], 10);
    assert_eq!(totals["empathy"], 10);
}

#[test]
fn snapshot_preserves_progress_mid_chronicle() {
    let engine = EncounterEngine::new();
    let mut evolution = EvolutionTracker::new("pc-1");
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..4 {
        resolve_until(
            &engine,
            ManifestationKind::Revenant,
            Resolution::Avoidance,
            &mut evolution,
            &mut rng,
            true,
        );
    }

    let json = serde_json::to_string(&evolution.snapshot()).unwrap();
    let restored = EvolutionTracker::from_snapshot(serde_json::from_str(&json).unwrap());

    assert_eq!(restored.evolution_points(), evolution.evolution_points());
    assert_eq!(
        restored
            .encounter_record(ManifestationKind::Revenant)
            .unwrap()
            .successful_encounters,
        4
    );
}

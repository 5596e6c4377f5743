//! Static encounter data: the per-kind fallback catalog and the fixed
//! resolution-effect and power lookups.
//!
//! The fallback catalog is the only failure-safe path when generation is
//! down, so it is complete by construction: every taxonomy member has an
//! entry, enforced by exhaustive matches, with non-empty clues and
//! resolution options. Fallback text never names the manifestation kind
//! directly; the player is meant to work it out from the clues.

use super::{CreatureEncounter, EncounterId, PlayerEffects, Resolution, ResolutionOptions};
use crate::taxonomy::{DangerLevel, ManifestationKind};

/// Baseline danger for a kind when generation cannot supply one.
pub fn default_danger(kind: ManifestationKind) -> DangerLevel {
    match kind {
        ManifestationKind::Sprite | ManifestationKind::Vessel => DangerLevel::Low,
        ManifestationKind::FolkSpirit | ManifestationKind::Changeling => DangerLevel::Medium,
        ManifestationKind::Revenant | ManifestationKind::Miasma => DangerLevel::High,
        ManifestationKind::Harbinger | ManifestationKind::Devourer => DangerLevel::Extreme,
    }
}

/// The statically authored encounter for a kind. Always succeeds.
pub fn fallback_encounter(kind: ManifestationKind) -> CreatureEncounter {
    let (description, clues, manifestations, effects, resolutions) = match kind {
        ManifestationKind::Changeling => (
            "Someone you know stands a little too still, smiling a little too long, \
             as if wearing a face they are still learning.",
            vec![
                "Their handwriting slants the wrong way.",
                "The dog will not come when they call.",
                "They no longer take sugar in their tea.",
            ],
            vec![
                "A reflection that lags half a breath behind.",
                "A voice that is right in every way but warmth.",
            ],
            PlayerEffects {
                immediate: "A crawling doubt about familiar faces.".to_string(),
                gradual: "Sleep comes harder each night spent near them.".to_string(),
                permanent: "You will always check the small habits first.".to_string(),
            },
            ResolutionOptions {
                peaceful: "Speak to what wears the face, and ask what it wants.".to_string(),
                confrontational: "Force the mask off in front of witnesses.".to_string(),
                avoidance: "Make excuses, keep distance, and watch from afar.".to_string(),
            },
        ),
        ManifestationKind::Harbinger => (
            "Something has crossed a threshold to stand at the edge of your sight, \
             and it has carried a message a long, long way.",
            vec![
                "Every clock in the room shows a different wrong time.",
                "Birds gather on the roofline facing inward.",
                "You knew it would rain before you looked outside.",
            ],
            vec![
                "Words arriving in your mind a moment before they are spoken.",
                "A tall figure at the crossroads that no one else remarks on.",
            ],
            PlayerEffects {
                immediate: "A ringing pressure behind the eyes.".to_string(),
                gradual: "Dreams that feel less like dreams each night.".to_string(),
                permanent: "Some knowledge, once delivered, cannot be returned.".to_string(),
            },
            ResolutionOptions {
                peaceful: "Receive the message with the courtesy owed a messenger.".to_string(),
                confrontational: "Refuse it loudly and drive the bearer back.".to_string(),
                avoidance: "Stop your ears and cross no thresholds until dawn.".to_string(),
            },
        ),
        ManifestationKind::Devourer => (
            "The larder is empty again, and the cold spot in the hall has moved \
             closer to the bedrooms. Whatever shares this place is still hungry.",
            vec![
                "Food spoils the night it is brought home.",
                "You cannot remember your grandmother's name, and neither can your mother.",
                "The cat eats facing the corner, watching something.",
            ],
            vec![
                "A gnawing silence that follows you between rooms.",
                "Warmth draining from whatever you hold too long.",
            ],
            PlayerEffects {
                immediate: "A hunger no meal quite answers.".to_string(),
                gradual: "Small memories going missing like coins.".to_string(),
                permanent: "A thinness at the edge of your recollection.".to_string(),
            },
            ResolutionOptions {
                peaceful: "Set a place for it, and negotiate what it may take.".to_string(),
                confrontational: "Starve it: seal, salt, and burn what it feeds through.".to_string(),
                avoidance: "Move what it wants beyond its reach and stay out of the hall at night.".to_string(),
            },
        ),
        ManifestationKind::FolkSpirit => (
            "The old customs of this place were broken, and something that keeps \
             accounts has come to collect — or to play.",
            vec![
                "Knots appear in the horses' manes overnight.",
                "The milk is sweet one day and sour the next.",
                "A ring of flattened grass where no one walks.",
            ],
            vec![
                "Laughter from empty air behind the byre.",
                "Small gifts appearing where small thefts occurred.",
            ],
            PlayerEffects {
                immediate: "The prickling sense of being a guest in your own home.".to_string(),
                gradual: "Luck curdling in small, deniable ways.".to_string(),
                permanent: "You will never again refuse an offering lightly.".to_string(),
            },
            ResolutionOptions {
                peaceful: "Restore the custom: bread, milk, and an honest apology.".to_string(),
                confrontational: "Name it by its deeds and turn it out with iron.".to_string(),
                avoidance: "Cede the contested ground and route around its haunts.".to_string(),
            },
        ),
        ManifestationKind::Revenant => (
            "Footsteps retrace an old route through the house each night, pausing \
             at the same door. Someone left something unfinished here.",
            vec![
                "The door is unlatched each morning though you lock it.",
                "A smell of turned earth with no garden near.",
                "The rocking chair faces the window it was never kept by.",
            ],
            vec![
                "A figure at the end of the lane, waiting without impatience.",
                "Your name said once, clearly, in an empty room.",
            ],
            PlayerEffects {
                immediate: "Grief that is not entirely yours.".to_string(),
                gradual: "Cold that settles in the bones of the house.".to_string(),
                permanent: "An obligation you did not take on, but now carry.".to_string(),
            },
            ResolutionOptions {
                peaceful: "Learn what was left undone, and finish it.".to_string(),
                confrontational: "Bar the route with salt and read the rites aloud.".to_string(),
                avoidance: "Sleep elsewhere and let the dead keep their schedule.".to_string(),
            },
        ),
        ManifestationKind::Miasma => (
            "The air in this place has gone heavy with an old shared grievance; \
             the room itself seems to hold its breath around you.",
            vec![
                "Lamplight dims in every room at once.",
                "Arguments start here over nothing and stop at the doorway.",
                "The plaster weeps in a pattern like handprints.",
            ],
            vec![
                "A weight on the chest in certain corners.",
                "Whispers with many voices and one opinion.",
            ],
            PlayerEffects {
                immediate: "A temper that is not your own rising in your throat.".to_string(),
                gradual: "A bone-deep tiredness in the afflicted rooms.".to_string(),
                permanent: "A sensitivity to rooms where bad things happened.".to_string(),
            },
            ResolutionOptions {
                peaceful: "Find the injustice at the root and see it acknowledged.".to_string(),
                confrontational: "Scour the place with light, air, and shouted truths.".to_string(),
                avoidance: "Close the rooms, seal the doors, and warn the others.".to_string(),
            },
        ),
        ManifestationKind::Sprite => (
            "Small things keep happening at the wild margin of the property: \
             mischief with a pattern, and the pattern is watching you.",
            vec![
                "Your keys are in the tree again.",
                "A sudden wind indoors, smelling of wet leaves.",
                "Lights between the trees that go out when named.",
            ],
            vec![
                "Giggling from the hedge with no child in it.",
                "A trail of pebbles that was not there at dusk.",
            ],
            PlayerEffects {
                immediate: "Exasperation shading into reluctant delight.".to_string(),
                gradual: "The garden thriving suspiciously well.".to_string(),
                permanent: "A habit of leaving the last apple on the tree.".to_string(),
            },
            ResolutionOptions {
                peaceful: "Leave out an offering and speak kindly at the margin.".to_string(),
                confrontational: "Catch it in the act and scold it by firelight.".to_string(),
                avoidance: "Lock what matters away and ignore the games.".to_string(),
            },
        ),
        ManifestationKind::Vessel => (
            "The old tool has been handled by four generations, and it has begun \
             to have opinions about the work.",
            vec![
                "The workshop is rearranged by morning, better than you left it.",
                "The chair returns to its corner however often it is moved.",
                "Music, faint and patient, from a closed instrument case.",
            ],
            vec![
                "A drawer that opens to offer exactly the wrong thing.",
                "Warmth in a handle on a cold morning.",
            ],
            PlayerEffects {
                immediate: "The distinct feeling of being assisted.".to_string(),
                gradual: "A reluctance to replace anything old.".to_string(),
                permanent: "You thank your tools now, quietly.".to_string(),
            },
            ResolutionOptions {
                peaceful: "Use it for the work it loves, and keep it oiled.".to_string(),
                confrontational: "Retire it to a shelf and assert who owns whom.".to_string(),
                avoidance: "Wrap it in cloth and give it to someone unsentimental.".to_string(),
            },
        ),
    };

    CreatureEncounter {
        id: EncounterId::new(),
        kind,
        description: description.to_string(),
        danger: default_danger(kind),
        clues: clues.into_iter().map(String::from).collect(),
        manifestations: manifestations.into_iter().map(String::from).collect(),
        effects,
        resolutions,
    }
}

/// Fixed mechanical effects of a resolution approach:
/// (success chance, experience on success, experience on failure,
/// attribute touched on success).
pub fn resolution_effects(resolution: Resolution) -> (f64, u32, u32, &'static str) {
    match resolution {
        Resolution::Peaceful => (0.6, 25, 8, "empathy"),
        Resolution::Confrontational => (0.5, 30, 10, "willpower"),
        Resolution::Avoidance => (0.8, 10, 4, "agility"),
        Resolution::Observe => (0.9, 15, 6, "perception"),
    }
}

/// Fixed lookup from (kind, resolution) to a granted power. Powers come
/// from this table, never from generation.
pub fn granted_power(kind: ManifestationKind, resolution: Resolution) -> Option<&'static str> {
    use ManifestationKind::*;
    use Resolution::*;

    match (kind, resolution) {
        (Changeling, Peaceful) => Some("Read the small habits that masks forget"),
        (Changeling, Confrontational) => Some("Voice that makes borrowed faces slip"),
        (Harbinger, Peaceful) => Some("Hear a message once and keep it whole"),
        (Harbinger, Confrontational) => Some("Stand unmoved at any threshold"),
        (Devourer, Peaceful) => Some("Portion out memory so none is stolen whole"),
        (Devourer, Confrontational) => Some("Seal a feeding path with salt and breath"),
        (FolkSpirit, Peaceful) => Some("Strike bargains the old ones honor"),
        (FolkSpirit, Confrontational) => Some("Name a trick as it is being played"),
        (Revenant, Peaceful) => Some("Carry an obligation without being bent by it"),
        (Revenant, Confrontational) => Some("Read the rites so the dead listen"),
        (Miasma, Peaceful) => Some("Breathe clean in poisoned rooms"),
        (Miasma, Confrontational) => Some("Shout a truth that thins the air"),
        (Sprite, Peaceful) => Some("Small luck at the wild margins"),
        (Sprite, Confrontational) => Some("See the pattern inside mischief"),
        (Vessel, Peaceful) => Some("Coax the best work from old tools"),
        (Vessel, Confrontational) => Some("Quiet a restless object with a touch"),
        // Avoidance and observation keep you safe, not stronger.
        (_, Avoidance) | (_, Observe) => None,
    }
}

/// Fixed lesson text recorded on a successful resolution.
pub fn learned_lesson(kind: ManifestationKind, resolution: Resolution) -> Option<&'static str> {
    match resolution {
        Resolution::Peaceful => Some(match kind {
            ManifestationKind::Changeling => "What wears a face still wants something",
            ManifestationKind::Harbinger => "A message refused is only delayed",
            ManifestationKind::Devourer => "Hunger bargained with is hunger bounded",
            ManifestationKind::FolkSpirit => "Custom is a wall; keep it mended",
            ManifestationKind::Revenant => "The dead ask little, but they ask",
            ManifestationKind::Miasma => "Grievance unheard becomes weather",
            ManifestationKind::Sprite => "Mischief is a toll, cheaply paid",
            ManifestationKind::Vessel => "Old things remember being needed",
        }),
        Resolution::Observe => Some("Watching first costs nothing and buys much"),
        Resolution::Confrontational | Resolution::Avoidance => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_catalog_complete() {
        for kind in ManifestationKind::ALL {
            let encounter = fallback_encounter(kind);
            assert_eq!(encounter.kind, kind);
            assert!(!encounter.description.is_empty());
            assert!(!encounter.clues.is_empty(), "{kind:?} has no clues");
            assert!(!encounter.manifestations.is_empty());
            assert!(!encounter.resolutions.peaceful.is_empty());
            assert!(!encounter.resolutions.confrontational.is_empty());
            assert!(!encounter.resolutions.avoidance.is_empty());
        }
    }

    #[test]
    fn test_fallback_never_names_the_kind() {
        // Content contract: player-facing fallback text must not name the
        // manifestation kind directly.
        for kind in ManifestationKind::ALL {
            let encounter = fallback_encounter(kind);
            let name = kind.name().to_lowercase();
            let mut text = encounter.description.to_lowercase();
            for clue in &encounter.clues {
                text.push_str(&clue.to_lowercase());
            }
            assert!(
                !text.contains(&name),
                "fallback for {kind:?} names it directly"
            );
        }
    }

    #[test]
    fn test_power_table_covers_active_resolutions() {
        for kind in ManifestationKind::ALL {
            assert!(granted_power(kind, Resolution::Peaceful).is_some());
            assert!(granted_power(kind, Resolution::Confrontational).is_some());
            assert!(granted_power(kind, Resolution::Avoidance).is_none());
        }
    }

    #[test]
    fn test_resolution_effects_shape() {
        for resolution in [
            Resolution::Peaceful,
            Resolution::Confrontational,
            Resolution::Avoidance,
            Resolution::Observe,
        ] {
            let (chance, xp_success, xp_failure, attribute) = resolution_effects(resolution);
            assert!((0.0..=1.0).contains(&chance));
            assert!(xp_success > xp_failure);
            assert!(!attribute.is_empty());
        }
    }
}

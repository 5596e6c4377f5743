//! Choice-pattern heuristics.
//!
//! The persona manager classifies recent play by substring-matching choice
//! identifiers against these tables. The matching is deliberately crude; the
//! tables exist so the policy is visible data rather than logic scattered
//! through the adaptation rules, and so a host can audit exactly which words
//! count as what.

/// Broad leanings a choice identifier can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceLeaning {
    Aggressive,
    Curious,
}

/// Substrings that mark a choice as aggressive.
const AGGRESSIVE_MARKERS: &[&str] = &[
    "attack", "fight", "strike", "threaten", "confront", "destroy", "burn", "force",
];

/// Substrings that mark a choice as curious.
const CURIOUS_MARKERS: &[&str] = &[
    "investigate", "examine", "search", "ask", "explore", "study", "listen", "follow",
];

/// Substrings that mark a choice as touching the supernatural.
const SUPERNATURAL_MARKERS: &[&str] = &[
    "spirit", "ghost", "ritual", "seance", "omen", "veil", "haunt", "summon", "ward",
];

/// Classify a single choice identifier. Aggressive markers win ties, since
/// an "attack the ghost" choice is read as aggression first.
pub fn classify(choice: &str) -> Option<ChoiceLeaning> {
    let lower = choice.to_lowercase();
    if AGGRESSIVE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(ChoiceLeaning::Aggressive);
    }
    if CURIOUS_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(ChoiceLeaning::Curious);
    }
    None
}

/// Count choices in a window expressing the given leaning.
pub fn count_leaning(choices: &[String], leaning: ChoiceLeaning) -> usize {
    choices
        .iter()
        .filter(|c| classify(c) == Some(leaning))
        .count()
}

/// Count choices in a window that brushed against the supernatural.
pub fn count_supernatural(choices: &[String]) -> usize {
    choices
        .iter()
        .filter(|c| {
            let lower = c.to_lowercase();
            SUPERNATURAL_MARKERS.iter().any(|m| lower.contains(m))
        })
        .count()
}

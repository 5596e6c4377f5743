//! Lenient parsing of generated narration.
//!
//! Generated text frequently wraps its JSON in markdown fences or pads it
//! with commentary. Parsing here is forgiving: pull out the first plausible
//! JSON object, take what validates, and fall back to fixed neutral output
//! when nothing does.

use serde::Deserialize;
use serde_json::Value;

/// Narration used when generation fails or returns nothing usable.
pub const FALLBACK_NARRATION: &str = "The mist thickens around you, and for a moment \
the world holds its breath. Nothing stirs, yet you sense the veil watching, \
waiting for your next step.";

/// Mood reported alongside [`FALLBACK_NARRATION`].
pub const FALLBACK_MOOD: &str = "mysterious";

/// Structured narration pulled from generated text.
#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeOutput {
    pub narration: String,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

impl NarrativeOutput {
    /// The fixed output used when generation yields nothing usable.
    pub fn fallback() -> Self {
        Self {
            narration: FALLBACK_NARRATION.to_string(),
            mood: Some(FALLBACK_MOOD.to_string()),
            suggestions: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Parse generated text, falling back to neutral output on anything
    /// unparseable or missing a narration.
    pub fn parse(text: &str) -> Self {
        extract_json(text)
            .and_then(|value| serde_json::from_value::<NarrativeOutput>(value).ok())
            .filter(|output| !output.narration.trim().is_empty())
            .unwrap_or_else(Self::fallback)
    }
}

/// Find the first JSON object in a block of text. Handles fenced
/// ```` ```json ```` blocks, bare fences, and raw JSON surrounded by prose.
pub(crate) fn extract_json(text: &str) -> Option<Value> {
    // A fenced block is the strongest signal; try it first.
    if let Some(inner) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str::<Value>(inner.trim()) {
            if value.is_object() {
                return Some(value);
            }
        }
    }

    // Otherwise scan from the first brace outward, trimming from the right
    // until something parses. Covers trailing commentary after the object.
    let start = text.find('{')?;
    let candidate = &text[start..];
    let mut end = candidate.rfind('}')?;
    loop {
        if let Ok(value) = serde_json::from_str::<Value>(&candidate[..=end]) {
            if value.is_object() {
                return Some(value);
            }
        }
        end = candidate[..end].rfind('}')?;
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip a language tag such as `json` on the fence line.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let body_end = body.find("```")?;
    Some(&body[..body_end])
}

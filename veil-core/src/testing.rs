//! Test doubles and assertion helpers.
//!
//! Available to integration tests and downstream hosts that want to drive
//! the narrator without a live generation service.

use crate::generation::{GenerationError, GenerationRequest, TextSource};
use crate::narrator::Narrator;
use crate::state::{ChoiceConsequences, GameState, Scene, SceneChoice};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// A [`TextSource`] that replays a scripted sequence of responses. Once the
/// script runs out, every call fails as unavailable.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    /// Prompts seen, for asserting on what was sent.
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response (builder style).
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure (builder style).
    pub fn with_failure(self, error: GenerationError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, entry: Result<String, GenerationError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }

    /// How many generation calls were made.
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copy of the requests seen so far.
    pub fn seen_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextSource for ScriptedSource {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match self.script.lock() {
            Ok(mut script) => script.pop_front().unwrap_or_else(|| {
                Err(GenerationError::Unavailable("script exhausted".to_string()))
            }),
            Err(_) => Err(GenerationError::Unavailable("script poisoned".to_string())),
        }
    }
}

/// A narration response wrapped in the JSON shape the narrator expects.
pub fn scripted_narration(narration: &str, mood: &str) -> String {
    serde_json::json!({ "narration": narration, "mood": mood }).to_string()
}

/// A plausible mid-game state for tests.
pub fn sample_state() -> GameState {
    GameState::new("pc-1")
        .with_level(3)
        .with_attribute("perception", 8)
        .with_attribute("willpower", 7)
        .with_attribute("empathy", 6)
}

/// A small authored scene with one consequential choice.
pub fn sample_scene() -> Scene {
    Scene {
        location: "old-mill".to_string(),
        time_of_day: "dusk".to_string(),
        weather: "low fog".to_string(),
        description: "The mill wheel turns though the race ran dry years ago.".to_string(),
        choices: vec![SceneChoice {
            id: "enter-mill".to_string(),
            text: "Step through the broken door".to_string(),
            consequences: Some(ChoiceConsequences {
                attribute_changes: BTreeMap::from([("willpower".to_string(), 1)]),
                experience: 12,
                health: -2,
            }),
        }],
    }
}

/// A narrator over a scripted source, plus the state and scene to drive it.
pub struct TestHarness {
    pub narrator: Narrator,
    pub state: GameState,
    pub scene: Scene,
}

impl TestHarness {
    /// Build a harness whose narrator will replay the given source.
    pub fn new(source: ScriptedSource) -> Self {
        Self {
            narrator: Narrator::new("pc-1", Box::new(source)),
            state: sample_state(),
            scene: sample_scene(),
        }
    }
}

/// Assert a string contains a fragment, with a readable failure.
#[track_caller]
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "expected {needle:?} within:\n{haystack}"
    );
}

/// Assert a string does not contain a fragment.
#[track_caller]
pub fn assert_not_contains(haystack: &str, needle: &str) {
    assert!(
        !haystack.contains(needle),
        "expected {needle:?} to be absent from:\n{haystack}"
    );
}

//! The seam between the engine and the narrative generation service.
//!
//! Generation is the only fallible external collaborator in the critical
//! path, so its failures are ordinary values here: every call site matches
//! on the `Result` and falls back to static content rather than letting an
//! error reach the player.

use async_trait::async_trait;
use oracle::{ChatRequest, Oracle};
use thiserror::Error;

/// A structured request to the generation service.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System instructions: persona block, world rules, memory context.
    pub system: String,
    /// User prompt: scene, situational context, the player's action.
    pub prompt: String,
    /// Model override, if any.
    pub model: Option<String>,
    /// Response token budget.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    /// Create a request with default budget and temperature.
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            model: None,
            max_tokens: 1024,
            temperature: Some(0.9),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Errors from the generation service, all recovered locally by callers.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    #[error("generation call exceeded its deadline")]
    Timeout,

    #[error("generation response was malformed: {0}")]
    Malformed(String),
}

/// A source of generated text. The production implementation wraps the
/// `oracle` client; tests substitute a scripted source.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Produce free text for the request, or a typed failure.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// [`TextSource`] backed by the `oracle` chat-completions client.
pub struct OracleSource {
    client: Oracle,
}

impl OracleSource {
    /// Wrap an existing client.
    pub fn new(client: Oracle) -> Self {
        Self { client }
    }

    /// Build from `ORACLE_API_KEY` and friends.
    pub fn from_env() -> Result<Self, oracle::Error> {
        Ok(Self {
            client: Oracle::from_env()?,
        })
    }
}

#[async_trait]
impl TextSource for OracleSource {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut chat = ChatRequest::from_prompt(request.prompt.clone())
            .with_system(request.system.clone())
            .with_max_tokens(request.max_tokens);
        if let Some(ref model) = request.model {
            chat = chat.with_model(model.clone());
        }
        if let Some(temperature) = request.temperature {
            chat = chat.with_temperature(temperature);
        }

        self.client.complete(chat).await.map_err(|e| match e {
            oracle::Error::Parse(message) => GenerationError::Malformed(message),
            other => GenerationError::Unavailable(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new("system", "prompt")
            .with_model("m")
            .with_max_tokens(256)
            .with_temperature(0.5);

        assert_eq!(request.system, "system");
        assert_eq!(request.max_tokens, 256);
        assert_eq!(request.model.as_deref(), Some("m"));
    }

    #[test]
    fn test_error_display() {
        let err = GenerationError::Timeout;
        assert!(err.to_string().contains("deadline"));
    }
}

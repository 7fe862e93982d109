//! Geoglyph Inference Provider Layer
//!
//! Implementations of the `InferenceProvider` trait from `geoglyph-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing and offline runs
//! - `OpenAiProvider`: OpenAI-compatible `chat/completions` API
//!
//! # Examples
//!
//! ```
//! use geoglyph_llm::MockProvider;
//! use geoglyph_domain::traits::InferenceProvider;
//!
//! let provider = MockProvider::new("{}");
//! let result = provider.generate_structured("test prompt", "{}").unwrap();
//! assert_eq!(result, "{}");
//! ```

#![warn(missing_docs)]

pub mod openai;

use geoglyph_domain::traits::{InferenceProvider, Recoverability};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during inference calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the model
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Credentials rejected by the API
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Provider is misconfigured (missing key, bad endpoint)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Whether the run has to stop
    ///
    /// Every further call would fail the same way for these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LlmError::Authentication(_) | LlmError::Configuration(_) | LlmError::ModelNotAvailable(_)
        )
    }
}

impl Recoverability for LlmError {
    fn is_fatal(&self) -> bool {
        LlmError::is_fatal(self)
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(LlmError),
}

/// Mock inference provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Replies are keyed by a substring of the prompt and checked in insertion
/// order; anything else gets the default response.
///
/// # Examples
///
/// ```
/// use geoglyph_llm::MockProvider;
/// use geoglyph_domain::traits::InferenceProvider;
///
/// let mut provider = MockProvider::new("{}");
/// provider.add_response_containing("ZONE SITE DETECTION", "zone response");
/// assert_eq!(provider.generate_structured("ZONE SITE DETECTION ...", "{}").unwrap(), "zone response");
/// assert_eq!(provider.generate_structured("REGIONAL NETWORK ANALYSIS ...", "{}").unwrap(), "{}");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    containing: Arc<Mutex<Vec<(String, MockReply)>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    images: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            containing: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            images: Arc::new(Mutex::new(0)),
        }
    }

    /// Respond to any prompt containing `needle`
    pub fn add_response_containing(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        lock(&self.containing).push((needle.into(), MockReply::Text(response.into())));
    }

    /// Return `error` for any prompt containing `needle`
    pub fn add_error_containing(&mut self, needle: impl Into<String>, error: LlmError) {
        lock(&self.containing).push((needle.into(), MockReply::Fail(error)));
    }

    /// Number of calls received
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Number of calls that carried an image
    pub fn image_count(&self) -> usize {
        *lock(&self.images)
    }

    fn reply_for(&self, prompt: &str) -> MockReply {
        lock(&self.containing)
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()))
    }
}

// A poisoned mock only means another test thread panicked; keep serving.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl InferenceProvider for MockProvider {
    type Error = LlmError;

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        lock(&self.prompts).push(prompt.to_string());

        match self.reply_for(prompt) {
            MockReply::Text(response) => Ok(response),
            MockReply::Fail(error) => Err(error),
        }
    }

    fn generate_with_image(&self, prompt: &str, schema: &str, _png: &[u8]) -> Result<String, Self::Error> {
        *lock(&self.images) += 1;
        self.generate_structured(prompt, schema)
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE_PROMPT: &str = "ZONE SITE DETECTION\nRegion: Upper Xingu Basin (Brazil)";
    const REGIONAL_PROMPT: &str = "REGIONAL NETWORK ANALYSIS\nRegion: Upper Xingu Basin (Brazil)";

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::default();
        let result = provider.generate_structured(REGIONAL_PROMPT, "{}");
        assert_eq!(result.unwrap(), "Default mock response");
    }

    #[test]
    fn test_first_matching_header_wins() {
        let mut provider = MockProvider::new("{}");
        provider.add_response_containing("ZONE SITE DETECTION", "zone");
        provider.add_response_containing("Upper Xingu", "region");

        assert_eq!(provider.generate_structured(ZONE_PROMPT, "{}").unwrap(), "zone");
        assert_eq!(provider.generate_structured(REGIONAL_PROMPT, "{}").unwrap(), "region");
        assert_eq!(provider.generate_structured("LEVERAGE DISCOVERY", "{}").unwrap(), "{}");
    }

    #[test]
    fn test_prompts_recorded_in_call_order() {
        let provider = MockProvider::new("{}");
        assert_eq!(provider.call_count(), 0);

        provider.generate_structured(REGIONAL_PROMPT, "{}").unwrap();
        provider.generate_with_image(ZONE_PROMPT, "{}", &[0x89, b'P', b'N', b'G']).unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.image_count(), 1);
        assert_eq!(provider.prompts(), vec![REGIONAL_PROMPT, ZONE_PROMPT]);
    }

    #[test]
    fn test_injected_errors_keep_their_fatality() {
        let mut provider = MockProvider::new("{}");
        provider.add_error_containing("REGIONAL", LlmError::Communication("reset".to_string()));
        provider.add_error_containing("ZONE", LlmError::Authentication("401".to_string()));

        let err = provider.generate_structured(REGIONAL_PROMPT, "{}").unwrap_err();
        assert!(!err.is_fatal());

        let err = provider.generate_structured(ZONE_PROMPT, "{}").unwrap_err();
        assert_eq!(err, LlmError::Authentication("401".to_string()));
        assert!(err.is_fatal());

        // Failed calls are still recorded
        assert_eq!(provider.call_count(), 2);
    }

    #[test]
    fn test_error_fatality() {
        assert!(LlmError::Configuration("no key".to_string()).is_fatal());
        assert!(LlmError::Authentication("401".to_string()).is_fatal());
        assert!(LlmError::ModelNotAvailable("gpt-4o".to_string()).is_fatal());
        assert!(!LlmError::Communication("timeout".to_string()).is_fatal());
        assert!(!LlmError::InvalidResponse("not json".to_string()).is_fatal());
        assert!(!LlmError::RateLimitExceeded.is_fatal());
    }

    #[test]
    fn test_mock_provider_shared_between_clones() {
        let provider = MockProvider::new("x");
        let clone = provider.clone();
        clone.generate_structured(ZONE_PROMPT, "{}").unwrap();
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.prompts(), vec![ZONE_PROMPT]);
    }
}

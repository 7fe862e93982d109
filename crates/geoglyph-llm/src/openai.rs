//! OpenAI-compatible Provider Implementation
//!
//! Talks to any endpoint implementing the `chat/completions` API in JSON
//! mode (OpenAI, Azure-style gateways, local servers such as vLLM).
//!
//! # Features
//!
//! - Blocking HTTP communication, one request per call, no retries
//! - JSON schema passed in the system message, `response_format = json_object`
//! - Optional image attachment as a base64 PNG data URL
//!
//! # Examples
//!
//! ```no_run
//! use geoglyph_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env("https://api.openai.com/v1", "gpt-4o").unwrap();
//! ```

use crate::LlmError;
use base64::Engine;
use geoglyph_domain::traits::InferenceProvider;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default timeout for inference requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI-compatible inference provider
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
    temperature: f32,
    vision: bool,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response from the chat completions API
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: API base URL (e.g., "https://api.openai.com/v1")
    /// - `model`: Model to use (e.g., "gpt-4o")
    /// - `api_key`: Bearer token
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the key is empty or the HTTP
    /// client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Configuration(format!("{} is not set", API_KEY_ENV)));
        }

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            temperature: 0.1,
            vision: false,
        })
    }

    /// Create a provider with the API key read from `OPENAI_API_KEY`
    pub fn from_env(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::new(endpoint, model, api_key)
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Result<Self, LlmError> {
        self.client = build_client(timeout_secs)?;
        Ok(self)
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Attach images to prompts (model must accept `image_url` parts)
    pub fn with_vision(mut self, vision: bool) -> Self {
        self.vision = vision;
        self
    }

    fn complete(&self, prompt: &str, schema: &str, png: Option<&[u8]>) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);

        let messages = vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(system_message(schema)),
            },
            ChatMessage {
                role: "user",
                content: user_content(prompt, png),
            },
        ];

        let request_body = ChatRequest {
            model: &self.model,
            messages,
            response_format: ResponseFormat { kind: "json_object" },
            temperature: self.temperature,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), image = png.is_some(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &self.model, &error_text));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response has no message content".to_string()))
    }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, LlmError> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

fn system_message(schema: &str) -> String {
    format!(
        "You are an expert archaeologist analysing remote sensing data. \
         Respond with a single JSON object that validates against this JSON schema:\n{}",
        schema
    )
}

fn user_content(prompt: &str, png: Option<&[u8]>) -> MessageContent {
    match png {
        Some(png) => MessageContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: png_data_url(png) },
            },
        ]),
        None => MessageContent::Text(prompt.to_string()),
    }
}

/// Encode PNG bytes as a `data:` URL
pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// Map a non-success HTTP status to an error
fn status_error(status: StatusCode, model: &str, body: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::Authentication(format!("HTTP {}: {}", status, body))
        }
        StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

impl InferenceProvider for OpenAiProvider {
    type Error = LlmError;

    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error> {
        self.complete(prompt, schema, None)
    }

    fn generate_with_image(&self, prompt: &str, schema: &str, png: &[u8]) -> Result<String, Self::Error> {
        let image = if self.vision { Some(png) } else { None };
        self.complete(prompt, schema, image)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::LlmConfig;
use crate::error::RelayError;

const TEMPERATURE: f64 = 1.0;
// The API takes maxTokens as a string
const MAX_TOKENS: &str = "2000";
const REASONING_MODE: &str = "ENABLED_HIDDEN";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub model_uri: String,
    pub completion_options: CompletionOptions,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    pub stream: bool,
    pub temperature: f64,
    pub max_tokens: String,
    pub reasoning_options: ReasoningOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReasoningOptions {
    pub mode: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub text: String,
}

impl CompletionRequest {
    /// Single user turn with the fixed generation options.
    pub fn new(model_uri: &str, prompt: &str) -> Self {
        Self {
            model_uri: model_uri.to_string(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS.to_string(),
                reasoning_options: ReasoningOptions {
                    mode: REASONING_MODE.to_string(),
                },
            },
            messages: vec![PromptMessage {
                role: "user".to_string(),
                text: prompt.to_string(),
            }],
        }
    }
}

// Everything is optional so that a well-formed body lacking the text maps
// to EmptyResponse rather than a decode failure.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    result: Option<CompletionResult>,
}

#[derive(Debug, Deserialize)]
struct CompletionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    message: Option<AlternativeMessage>,
}

#[derive(Debug, Deserialize)]
struct AlternativeMessage {
    #[serde(default)]
    text: Option<String>,
}

impl CompletionResponse {
    fn into_text(self) -> Option<String> {
        self.result?
            .alternatives
            .into_iter()
            .next()?
            .message?
            .text
            .filter(|t| !t.is_empty())
    }
}

/// Something that turns a prompt into completion text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RelayError>;
}

pub struct YandexGptClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl YandexGptClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CompletionClient for YandexGptClient {
    async fn complete(&self, prompt: &str) -> Result<String, RelayError> {
        if prompt.trim().is_empty() {
            warn!("Refusing to send an empty prompt");
            return Err(RelayError::EmptyMessage);
        }

        let request = CompletionRequest::new(&self.config.model, prompt);

        debug!("Sending completion request to {}", self.config.api_url);

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Api-Key {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                RelayError::Request(format!("failed to send request: {}", e))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Unexpected completion API status: {}", status);
            return Err(RelayError::Request(format!(
                "unexpected response status: {}",
                status.as_u16()
            )));
        }

        let body = response.text().await.map_err(|e| {
            error!("Failed to read completion response body: {}", e);
            RelayError::Request(format!("failed to read response: {}", e))
        })?;

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to decode completion response: {}", e);
            RelayError::Request(format!("failed to decode response: {}", e))
        })?;

        match parsed.into_text() {
            Some(text) => {
                debug!("Completion received: {} chars", text.chars().count());
                Ok(text)
            }
            None => {
                warn!("Completion response contains no text");
                Err(RelayError::EmptyResponse)
            }
        }
    }
}

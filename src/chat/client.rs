// file: src/chat/client.rs
// description: OpenAI-compatible chat completions client for a local inference server
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::ChatConfig;
use crate::error::{Result, ToolkitError};
use crate::models::{ChatOutcome, ChatRequest};
use crate::utils::Validator;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Optional per-call overrides of the configured generation settings
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions<'a> {
    pub model: Option<&'a str>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Sends `messages` to `/chat/completions` and returns the first choice's text
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions<'_>,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: options.model.unwrap_or(&self.config.model),
            messages,
            // a zero token budget falls back to the configured default
            max_tokens: options
                .max_tokens
                .filter(|&t| t > 0)
                .unwrap_or(self.config.max_tokens),
            temperature: options.temperature.unwrap_or(self.config.temperature),
        };

        debug!(
            "Requesting completion from {} with model {}",
            self.config.base_url, request.model
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ToolkitError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ToolkitError::Serialization("No choices returned by model server".to_string()))
    }

    /// Single-prompt generation; every failure is folded into the envelope
    pub async fn generate(&self, request: &ChatRequest) -> ChatOutcome {
        if let Err(e) = Validator::validate_not_blank("Prompt", &request.prompt) {
            return ChatOutcome::failure(e.to_string());
        }

        let model = request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.config.model)
            .to_string();

        let options = GenerationOptions {
            model: Some(&model),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        match self
            .complete(&[ChatMessage::user(request.prompt.trim())], &options)
            .await
        {
            Ok(message) => ChatOutcome::reply(message, model),
            Err(e) => {
                warn!("Chat completion failed: {}", e);
                ChatOutcome::failure(self.describe_error(&e))
            }
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolkitError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let list: ModelList = response.json().await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    fn describe_error(&self, err: &ToolkitError) -> String {
        match err {
            ToolkitError::Http(e) if e.is_connect() || e.is_timeout() => format!(
                "Connection error: Unable to connect to the model server at {}. Please ensure the server is running.",
                self.config.base_url
            ),
            ToolkitError::Upstream { .. } => err.to_string(),
            other => format!("Unexpected error: {}", other),
        }
    }
}

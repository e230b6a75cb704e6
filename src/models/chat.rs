// file: src/models/chat.rs
// description: chat proxy request and response envelopes
// reference: OpenAI-compatible chat completions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body accepted by `POST /api/chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Reads a browser body without rejecting it over field types. A null or
    /// non-string prompt becomes empty and unusable optional fields are
    /// dropped. `None` only when `prompt` is absent.
    pub fn from_json(body: &Value) -> Option<Self> {
        let prompt = body.get("prompt")?;

        Some(Self {
            prompt: prompt.as_str().unwrap_or_default().to_string(),
            model: body
                .get("model")
                .and_then(Value::as_str)
                .map(str::to_string),
            max_tokens: body
                .get("max_tokens")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n > 0),
            temperature: body
                .get("temperature")
                .and_then(Value::as_f64)
                .map(|t| t as f32)
                .filter(|t| t.is_finite()),
        })
    }
}

/// Envelope relayed to the browser; `error` is only set on failure and
/// `model` only on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatOutcome {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatOutcome {
    pub fn reply(message: String, model: String) -> Self {
        Self {
            success: true,
            message,
            model: Some(model),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: String::new(),
            model: None,
            error: Some(error.into()),
        }
    }
}

// file: src/rag/embeddings.rs
// description: text embedding backends, OpenAI-compatible HTTP and an offline hashed bag of words
// reference: https://platform.openai.com/docs/api-reference/embeddings

use crate::config::{ChatConfig, RagConfig};
use crate::error::{Result, ToolkitError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

pub trait Embedder {
    /// One vector per input text, in input order
    fn embed(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;

    fn name(&self) -> String;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Calls `{base_url}/embeddings` on the same server that serves chat
pub struct OpenAiEmbeddings {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(chat: &ChatConfig, rag: &RagConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(chat.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: chat.base_url.trim_end_matches('/').to_string(),
            api_key: chat.api_key.clone(),
            model: rag.embedding_model.clone(),
        })
    }
}

impl Embedder for OpenAiEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Requesting {} embeddings from {}", texts.len(), self.base_url);

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
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

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(ToolkitError::Serialization(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> String {
        format!("{} via {}", self.model, self.base_url)
    }
}

/// Deterministic offline embedder: signed hashed bag of lowercase words, L2-normalised
pub struct HashEmbeddings {
    dimension: usize,
}

impl HashEmbeddings {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(ToolkitError::InvalidInput(
                "embedding_dim must be greater than 0".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        normalize(&mut vector);
        vector
    }
}

impl Embedder for HashEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn name(&self) -> String {
        format!("offline hash ({} dims)", self.dimension)
    }
}

/// Backend picked at runtime by the CLI
pub enum EmbeddingBackend {
    OpenAi(OpenAiEmbeddings),
    Hash(HashEmbeddings),
}

impl EmbeddingBackend {
    pub fn from_config(chat: &ChatConfig, rag: &RagConfig, offline: bool) -> Result<Self> {
        if offline {
            Ok(Self::Hash(HashEmbeddings::new(rag.embedding_dim)?))
        } else {
            Ok(Self::OpenAi(OpenAiEmbeddings::new(chat, rag)?))
        }
    }
}

impl Embedder for EmbeddingBackend {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::OpenAi(e) => e.embed(texts).await,
            Self::Hash(e) => e.embed(texts).await,
        }
    }

    fn name(&self) -> String {
        match self {
            Self::OpenAi(e) => e.name(),
            Self::Hash(e) => e.name(),
        }
    }
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

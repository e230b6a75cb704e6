// file: src/rag/pipeline.rs
// description: load, split, embed and index documents, then answer questions from retrieved chunks
// reference: uses indicatif for embedding progress

use crate::chat::{ChatClient, ChatMessage, GenerationOptions};
use crate::config::Config;
use crate::error::{Result, ToolkitError};
use crate::models::{Chunk, Document, SearchHit};
use crate::rag::embeddings::Embedder;
use crate::rag::index::VectorIndex;
use crate::rag::loader::DocumentLoader;
use crate::rag::splitter::TextSplitter;
use crate::utils::{OperationTimer, Validator};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "Use the following context to answer the question. \
If the answer is not contained in the context, say that you don't know.";

const SLOW_INGEST: Duration = Duration::from_secs(120);
const SLOW_ANSWER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SearchHit>,
}

pub struct RagPipeline<E: Embedder> {
    loader: DocumentLoader,
    splitter: TextSplitter,
    embedder: E,
    index: VectorIndex,
    /// Content hashes of documents already indexed
    seen: HashSet<String>,
    chat: ChatClient,
    top_k: usize,
    batch_size: usize,
    show_progress: bool,
}

impl<E: Embedder> RagPipeline<E> {
    pub fn new(config: &Config, embedder: E, show_progress: bool) -> Result<Self> {
        Validator::validate_batch_size(config.rag.embedding_batch_size)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.chat.request_timeout_secs))
            .build()?;

        Ok(Self {
            loader: DocumentLoader::new(http),
            splitter: TextSplitter::new(config.rag.chunk_size, config.rag.chunk_overlap)?,
            embedder,
            index: VectorIndex::new(),
            seen: HashSet::new(),
            chat: ChatClient::new(config.chat.clone())?,
            top_k: config.rag.top_k.max(1),
            batch_size: config.rag.embedding_batch_size,
            show_progress,
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Loads a file, directory or URL and indexes its chunks; returns the chunk count
    pub async fn ingest(&mut self, source: &str) -> Result<usize> {
        let documents = self.loader.load(source).await?;
        if documents.is_empty() {
            return Err(ToolkitError::InvalidInput(format!(
                "No readable documents found in {}",
                source
            )));
        }
        self.ingest_documents(documents).await
    }

    pub async fn ingest_documents(&mut self, documents: Vec<Document>) -> Result<usize> {
        let timer = OperationTimer::new("ingest");

        let total = documents.len();
        let mut hashes = HashSet::new();
        let fresh: Vec<Document> = documents
            .into_iter()
            .filter(|doc| !doc.is_empty())
            .filter(|doc| {
                let first = !self.seen.contains(&doc.content_hash)
                    && hashes.insert(doc.content_hash.clone());
                if !first {
                    debug!("Skipping {}: content already indexed", doc.source);
                }
                first
            })
            .collect();

        let chunks: Vec<Chunk> = fresh
            .iter()
            .flat_map(|doc| self.splitter.split_document(doc))
            .collect();
        info!(
            "Split {} of {} documents into {} chunks using {}",
            fresh.len(),
            total,
            chunks.len(),
            self.embedder.name()
        );

        let progress = self.progress_bar(chunks.len() as u64);
        let mut added = 0;

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            self.index.add(batch.to_vec(), vectors)?;

            added += batch.len();
            progress.inc(batch.len() as u64);
            debug!("Embedded {}/{} chunks", added, chunks.len());
        }

        progress.finish_with_message("embedded");
        self.seen.extend(hashes);
        timer.warn_if_slow(SLOW_INGEST, &format!("embedding {} chunks", added));
        timer.finish_with_count(added);
        Ok(added)
    }

    /// Top-k chunks for the question
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>> {
        Validator::validate_not_blank("Question", question)?;

        if self.index.is_empty() {
            return Err(ToolkitError::InvalidInput(
                "No documents have been ingested".to_string(),
            ));
        }

        let query = self
            .embedder
            .embed(&[question.trim().to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ToolkitError::Serialization("Embedder returned no vector".to_string()))?;

        self.index.search(&query, self.top_k)
    }

    pub async fn ask(&self, question: &str) -> Result<RagAnswer> {
        let timer = OperationTimer::new("ask");
        let sources = self.retrieve(question).await?;

        let context = sources
            .iter()
            .map(|hit| format!("[{}]\n{}", hit.source, hit.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let messages = [
            ChatMessage::system(format!("{}\n\nContext:\n{}", SYSTEM_PROMPT, context)),
            ChatMessage::user(question.trim()),
        ];

        let answer = self
            .chat
            .complete(&messages, &GenerationOptions::default())
            .await?;

        timer.warn_if_slow(SLOW_ANSWER, "answer generation");
        timer.finish();
        Ok(RagAnswer { answer, sources })
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} chunks {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar
    }
}

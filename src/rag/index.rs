// file: src/rag/index.rs
// description: in-memory vector store with brute-force cosine search
// reference: internal data structures

use crate::error::{Result, ToolkitError};
use crate::models::{Chunk, SearchHit};

#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
    dimension: Option<usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// All-or-nothing: a rejected batch leaves the index unchanged
    pub fn add(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(ToolkitError::InvalidInput(format!(
                "Got {} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let mut dimension = self.dimension;
        for vector in &vectors {
            match dimension {
                Some(expected) if expected != vector.len() => {
                    return Err(ToolkitError::InvalidInput(format!(
                        "Vector dimension {} does not match index dimension {}",
                        vector.len(),
                        expected
                    )));
                }
                None if vector.is_empty() => {
                    return Err(ToolkitError::InvalidInput(
                        "Vectors must not be empty".to_string(),
                    ));
                }
                None => dimension = Some(vector.len()),
                _ => {}
            }
        }

        self.dimension = dimension;
        self.entries.extend(chunks.into_iter().zip(vectors));
        Ok(())
    }

    /// Top `k` chunks by cosine similarity, best first; ties keep insertion order
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if let Some(expected) = self.dimension
            && expected != query.len()
        {
            return Err(ToolkitError::InvalidInput(format!(
                "Query dimension {} does not match index dimension {}",
                query.len(),
                expected
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, (_, vector))| (position, cosine_similarity(query, vector)))
            .collect();

        // stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(position, score)| {
                let chunk = &self.entries[position].0;
                SearchHit {
                    chunk_id: chunk.id.clone(),
                    source: chunk.source.clone(),
                    chunk_index: chunk.index,
                    text: chunk.text.clone(),
                    score,
                }
            })
            .collect())
    }
}

/// Zero-length vectors score 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

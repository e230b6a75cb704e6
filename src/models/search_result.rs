// file: src/models/search_result.rs
// description: Retrieved chunk with its similarity score
// reference: Used for vector similarity search results

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: String,

    /// File path or URL of the originating document
    pub source: String,

    pub chunk_index: usize,

    pub text: String,

    /// Cosine similarity, higher is more similar (-1.0..=1.0)
    pub score: f32,
}

impl SearchHit {
    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        format!(
            "Score: {:.4} | {} (chunk {})\n{}\n",
            self.score,
            self.source,
            self.chunk_index,
            crate::utils::Validator::truncate_text(&self.text, max_content_len)
        )
    }
}

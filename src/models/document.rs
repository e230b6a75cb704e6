// file: src/models/document.rs
// description: loaded source documents and the chunks cut from them for retrieval
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Plain text extracted from a file or URL, ready for splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// File path or URL the text came from
    pub source: String,
    pub content: String,
    pub content_hash: String,
}

impl Document {
    pub fn new(source: String, content: String) -> Self {
        let content_hash = compute_hash(&content);
        Self {
            source,
            content,
            content_hash,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A window of a document's text; the unit that gets embedded and indexed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub source: String,
    /// Position of the chunk within its document
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(source: &str, index: usize, text: String) -> Self {
        Self {
            id: compute_hash(&format!("{}#{}", source, index)),
            source: source.to_string(),
            index,
            text,
        }
    }
}

fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new("notes/intro.md".to_string(), "# Intro".to_string());
        assert_eq!(doc.source, "notes/intro.md");
        assert_eq!(doc.content_hash.len(), 64);
        assert!(!doc.is_empty());
        assert!(Document::new("x".into(), "  \n".into()).is_empty());
    }

    #[test]
    fn test_chunk_ids_depend_on_source_and_position() {
        let a = Chunk::new("a.txt", 0, "same".to_string());
        let b = Chunk::new("a.txt", 1, "same".to_string());
        let c = Chunk::new("a.txt", 0, "other".to_string());
        assert_ne!(a.id, b.id);
        assert_eq!(a.id, c.id);
    }
}

// file: src/rag/mod.rs
// description: retrieval-augmented generation over local files and web pages
// reference: internal module structure

pub mod embeddings;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod splitter;

pub use embeddings::{Embedder, EmbeddingBackend, HashEmbeddings, OpenAiEmbeddings};
pub use index::VectorIndex;
pub use loader::DocumentLoader;
pub use pipeline::{RagAnswer, RagPipeline};
pub use splitter::TextSplitter;

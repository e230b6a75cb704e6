// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod chat;
pub mod document;
pub mod execution;
pub mod filesystem;
pub mod search_result;

pub use chat::{ChatOutcome, ChatRequest};
pub use document::{Chunk, Document};
pub use execution::ExecutionResult;
pub use filesystem::{
    DirEntryInfo, EntryKind, FileContent, FileOperation, LineMatch, PathOutcome, SearchOutcome,
    TextEncoding, WriteOutcome,
};
pub use search_result::SearchHit;

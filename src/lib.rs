// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod chat;
pub mod config;
pub mod doctor;
pub mod error;
pub mod filesystem;
pub mod mcp;
pub mod models;
pub mod rag;
pub mod shell;
pub mod utils;

pub use chat::{ChatClient, ChatMessage, GenerationOptions};
pub use config::{ChatConfig, Config, FilesystemConfig, RagConfig, ShellConfig};
pub use error::{Result, ToolkitError};
pub use filesystem::{FileManager, Sandbox};
pub use mcp::{FilesystemMcp, ShellMcp};
pub use models::{ChatOutcome, ChatRequest, Chunk, Document, ExecutionResult, SearchHit};
pub use rag::{EmbeddingBackend, RagAnswer, RagPipeline};
pub use shell::{ShellExecutor, ShellKind};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};

// file: src/chat/mod.rs
// description: chat proxy module exports
// reference: internal module structure

pub mod client;
pub mod server;

pub use client::{ChatClient, ChatMessage, GenerationOptions};
pub use server::{AppState, router, serve};

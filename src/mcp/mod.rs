// file: src/mcp/mod.rs
// description: MCP (Model Context Protocol) servers for agentic tool integration
// reference: https://docs.rs/rmcp

pub mod filesystem;
pub mod shell;

pub use filesystem::FilesystemMcp;
pub use shell::ShellMcp;

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Pretty JSON on success, `Error: <message>` flagged as a tool error otherwise.
/// Failures stay inside the tool result so the agent can read and react to them.
pub fn tool_result<T: Serialize>(outcome: crate::Result<T>) -> CallToolResult {
    let rendered = outcome.and_then(|value| Ok(serde_json::to_string_pretty(&value)?));

    match rendered {
        Ok(json) => CallToolResult::success(vec![Content::text(json)]),
        Err(e) => CallToolResult::error(vec![Content::text(format!("Error: {}", e))]),
    }
}

// file: src/mcp/shell.rs
// description: MCP server exposing command execution in CMD, PowerShell, WSL, Git Bash and sh
// reference: https://docs.rs/rmcp

use crate::config::ShellConfig;
use crate::models::ExecutionResult;
use crate::shell::{ShellExecutor, ShellKind};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

pub const SERVER_NAME: &str = "shell-executor";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteArgs {
    /// The command to execute
    pub command: String,
    /// Optional working directory for command execution (Windows paths are converted for WSL and Git Bash)
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Optional timeout in seconds (default: 30)
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Clone)]
pub struct ShellMcp {
    executor: Arc<ShellExecutor>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ShellMcp {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            executor: Arc::new(ShellExecutor::new(config)),
            tool_router: Self::tool_router(),
        }
    }

    pub fn get_tool_router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    async fn dispatch(&self, kind: ShellKind, args: ExecuteArgs) -> Result<CallToolResult, McpError> {
        let result = self
            .executor
            .execute(kind, &args.command, args.working_dir.as_deref(), args.timeout)
            .await;
        execution_result(&result)
    }

    #[tool(
        description = "Execute a command in Windows Command Prompt (CMD). Use for Windows-native commands like dir, copy, del, etc."
    )]
    async fn execute_cmd(
        &self,
        Parameters(args): Parameters<ExecuteArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(ShellKind::Cmd, args).await
    }

    #[tool(
        description = "Execute a command or script in PowerShell. Use for PowerShell cmdlets, .NET operations, and advanced Windows scripting."
    )]
    async fn execute_powershell(
        &self,
        Parameters(args): Parameters<ExecuteArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(ShellKind::PowerShell, args).await
    }

    #[tool(
        description = "Execute a command in WSL (Windows Subsystem for Linux) / Ubuntu. Use for Linux commands, bash scripts, and Unix utilities."
    )]
    async fn execute_wsl(
        &self,
        Parameters(args): Parameters<ExecuteArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(ShellKind::Wsl, args).await
    }

    #[tool(
        description = "Execute a command in Git Bash. Use for Git operations and Unix-like commands on Windows."
    )]
    async fn execute_gitbash(
        &self,
        Parameters(args): Parameters<ExecuteArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(ShellKind::GitBash, args).await
    }

    #[tool(description = "Execute a command with the POSIX shell (sh -c) on Linux or macOS hosts.")]
    async fn execute_sh(
        &self,
        Parameters(args): Parameters<ExecuteArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(ShellKind::Sh, args).await
    }
}

#[tool_handler]
impl ServerHandler for ShellMcp {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info,
            instructions: Some(format!(
                "Runs commands in CMD, PowerShell, WSL, Git Bash or sh. Default timeout {}s.",
                self.executor.default_timeout_secs()
            )),
        }
    }
}

fn execution_result(result: &ExecutionResult) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| McpError::internal_error(format!("Failed to serialize result: {}", e), None))?;

    Ok(if result.is_success() {
        CallToolResult::success(vec![Content::text(json)])
    } else {
        CallToolResult::error(vec![Content::text(json)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_tools_registered() {
        let server = ShellMcp::new(&ShellConfig::default());
        let mut names: Vec<String> = server
            .get_tool_router()
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "execute_cmd",
                "execute_gitbash",
                "execute_powershell",
                "execute_sh",
                "execute_wsl",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_sh_returns_json_payload() {
        let server = ShellMcp::new(&ShellConfig::default());
        let result = server
            .execute_sh(Parameters(ExecuteArgs {
                command: "echo mcp".to_string(),
                working_dir: None,
                timeout: Some(5),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(false));
        let text = result.content[0].as_text().unwrap().text.clone();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["stdout"], "mcp\n");
        assert_eq!(value["exit_code"], 0);
        assert_eq!(value["shell"], "sh");
    }
}

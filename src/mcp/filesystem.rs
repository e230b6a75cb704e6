// file: src/mcp/filesystem.rs
// description: MCP server exposing the sandboxed filesystem operations as tools
// reference: https://docs.rs/rmcp

use crate::config::FilesystemConfig;
use crate::error::Result as ToolkitResult;
use crate::filesystem::FileManager;
use crate::mcp::tool_result;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const SERVER_NAME: &str = "filesystem-manager";
const RESOURCE_SCHEME: &str = "file:///";

fn current_dir() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDirectoryArgs {
    /// Directory path to list (relative to base directory). Use '.' for current directory.
    #[serde(default = "current_dir")]
    pub path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FilePathArgs {
    /// Path to the file (relative to base directory)
    pub file_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchFileArgs {
    /// Path to the file to search (relative to base directory)
    pub file_path: String,
    /// String to search for within the file
    pub search_string: String,
    /// Whether the search should be case-sensitive (default: false)
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileArgs {
    /// Path to the file to write (relative to base directory)
    pub file_path: String,
    /// Content to write to the file
    pub content: String,
    /// Create parent directories if they don't exist (default: false)
    #[serde(default)]
    pub create_dirs: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AppendFileArgs {
    /// Path to the file to append to (relative to base directory)
    pub file_path: String,
    /// Content to append to the file
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateFileArgs {
    /// Path to the file to update (relative to base directory)
    pub file_path: String,
    /// String to search for and replace
    pub search_string: String,
    /// String to replace matches with
    pub replace_string: String,
    /// Whether the search should be case-sensitive (default: false)
    #[serde(default)]
    pub case_sensitive: bool,
    /// Maximum number of replacements to make (default: unlimited)
    #[serde(default)]
    pub max_replacements: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDirectoryArgs {
    /// Path to the directory to create (relative to base directory)
    pub directory_path: String,
    /// Create parent directories if they don't exist (default: false)
    #[serde(default)]
    pub parents: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteDirectoryArgs {
    /// Path to the directory to delete (relative to base directory)
    pub directory_path: String,
    /// Delete directory and all its contents recursively (default: false)
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Clone)]
pub struct FilesystemMcp {
    files: Arc<FileManager>,
    tool_router: ToolRouter<Self>,
}

impl FilesystemMcp {
    /// Read tools are always exposed; write and delete tools only when the
    /// configuration enables them.
    pub fn new(config: &FilesystemConfig) -> ToolkitResult<Self> {
        let files = FileManager::new(config)?;

        let mut tool_router = Self::read_router();
        if files.sandbox().allows_write() {
            tool_router = tool_router + Self::write_router();
        }
        if files.sandbox().allows_delete() {
            tool_router = tool_router + Self::delete_router();
        }

        Ok(Self {
            files: Arc::new(files),
            tool_router,
        })
    }

    pub fn get_tool_router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }

    pub fn files(&self) -> &FileManager {
        &self.files
    }

    /// Filesystem calls block, so they run on the blocking pool
    async fn run_blocking<T, F>(&self, op: F) -> std::result::Result<CallToolResult, McpError>
    where
        T: Serialize + Send + 'static,
        F: FnOnce(&FileManager) -> ToolkitResult<T> + Send + 'static,
    {
        let files = Arc::clone(&self.files);
        let outcome = tokio::task::spawn_blocking(move || op(&files))
            .await
            .map_err(|e| McpError::internal_error(format!("Tool task failed: {}", e), None))?;
        Ok(tool_result(outcome))
    }

    fn listing_json(&self, path: &str) -> ToolkitResult<String> {
        let items = self.files.list_directory(path)?;
        Ok(serde_json::to_string_pretty(&items)?)
    }

    fn root_uri(&self) -> String {
        format!("{}{}", RESOURCE_SCHEME, self.files.sandbox().base_dir().display())
    }

    /// Directory listing behind a `file:///` URI; an empty path is the base directory
    fn resource_listing(&self, uri: &str) -> std::result::Result<String, McpError> {
        let requested = uri.strip_prefix(RESOURCE_SCHEME).ok_or_else(|| {
            McpError::invalid_params(
                "Invalid resource URI",
                Some(serde_json::json!({ "uri": uri })),
            )
        })?;
        let requested = if requested.is_empty() { "." } else { requested };

        self.listing_json(requested).map_err(|e| {
            McpError::resource_not_found(e.to_string(), Some(serde_json::json!({ "uri": uri })))
        })
    }
}

#[tool_router(router = read_router)]
impl FilesystemMcp {
    #[tool(
        description = "List all files and directories in a specified path. Returns name, type, size, and modification date for each item."
    )]
    async fn list_directory(
        &self,
        Parameters(args): Parameters<ListDirectoryArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: list_directory {}", args.path);
        self.run_blocking(move |fm| fm.list_directory(&args.path)).await
    }

    #[tool(
        description = "Read the complete contents of a file. Returns the file content, size, and metadata."
    )]
    async fn read_file(
        &self,
        Parameters(args): Parameters<FilePathArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: read_file {}", args.file_path);
        self.run_blocking(move |fm| fm.read_file(&args.file_path)).await
    }

    #[tool(
        description = "Search for a specific string within a file. Returns all matching lines with line numbers."
    )]
    async fn search_file(
        &self,
        Parameters(args): Parameters<SearchFileArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: search_file {} for {:?}", args.file_path, args.search_string);
        self.run_blocking(move |fm| {
            fm.search_file(&args.file_path, &args.search_string, args.case_sensitive)
        })
        .await
    }
}

#[tool_router(router = write_router)]
impl FilesystemMcp {
    #[tool(
        description = "Write content to a file. Creates new file or overwrites existing one. Optionally creates parent directories."
    )]
    async fn write_file(
        &self,
        Parameters(args): Parameters<WriteFileArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: write_file {}", args.file_path);
        self.run_blocking(move |fm| fm.write_file(&args.file_path, &args.content, args.create_dirs))
            .await
    }

    #[tool(description = "Append content to the end of an existing file.")]
    async fn append_file(
        &self,
        Parameters(args): Parameters<AppendFileArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: append_file {}", args.file_path);
        self.run_blocking(move |fm| fm.append_file(&args.file_path, &args.content))
            .await
    }

    #[tool(
        description = "Update file by replacing occurrences of a string with another string. Supports case-sensitive and case-insensitive replacement."
    )]
    async fn update_file(
        &self,
        Parameters(args): Parameters<UpdateFileArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: update_file {}", args.file_path);
        self.run_blocking(move |fm| {
            fm.update_file(
                &args.file_path,
                &args.search_string,
                &args.replace_string,
                args.case_sensitive,
                args.max_replacements,
            )
        })
        .await
    }

    #[tool(description = "Create a new directory. Optionally creates parent directories.")]
    async fn create_directory(
        &self,
        Parameters(args): Parameters<CreateDirectoryArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: create_directory {}", args.directory_path);
        self.run_blocking(move |fm| fm.create_directory(&args.directory_path, args.parents))
            .await
    }
}

#[tool_router(router = delete_router)]
impl FilesystemMcp {
    #[tool(description = "Delete a file. This operation is irreversible.")]
    async fn delete_file(
        &self,
        Parameters(args): Parameters<FilePathArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: delete_file {}", args.file_path);
        self.run_blocking(move |fm| fm.delete_file(&args.file_path)).await
    }

    #[tool(
        description = "Delete a directory. Optionally deletes recursively including all contents."
    )]
    async fn delete_directory(
        &self,
        Parameters(args): Parameters<DeleteDirectoryArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: delete_directory {}", args.directory_path);
        self.run_blocking(move |fm| fm.delete_directory(&args.directory_path, args.recursive))
            .await
    }
}

#[tool_handler]
impl ServerHandler for FilesystemMcp {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();

        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info,
            instructions: Some(format!(
                "Full CRUD access to files and directories below {}. Paths are relative to that directory.",
                self.files.sandbox().base_dir().display()
            )),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListResourcesResult, McpError> {
        let base = self.files.sandbox().base_dir().display().to_string();

        let mut raw = RawResource::new(self.root_uri(), "File System Root");
        raw.description = Some(format!(
            "Full CRUD access to files and directories from: {}",
            base
        ));
        raw.mime_type = Some("application/json".to_string());

        Ok(ListResourcesResult {
            resources: vec![raw.no_annotation()],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ReadResourceResult, McpError> {
        let listing = self.resource_listing(&uri)?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(listing, uri.clone())],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tool_names(server: &FilesystemMcp) -> Vec<String> {
        let mut names: Vec<String> = server
            .get_tool_router()
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_all_tools_listed_when_enabled() {
        let temp = TempDir::new().unwrap();
        let server = FilesystemMcp::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            ..FilesystemConfig::default()
        })
        .unwrap();

        assert_eq!(
            tool_names(&server),
            vec![
                "append_file",
                "create_directory",
                "delete_directory",
                "delete_file",
                "list_directory",
                "read_file",
                "search_file",
                "update_file",
                "write_file",
            ]
        );
    }

    #[test]
    fn test_disabled_tools_are_hidden() {
        let temp = TempDir::new().unwrap();
        let server = FilesystemMcp::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            allow_write: false,
            allow_delete: false,
            ..FilesystemConfig::default()
        })
        .unwrap();

        assert_eq!(
            tool_names(&server),
            vec!["list_directory", "read_file", "search_file"]
        );
    }

    #[tokio::test]
    async fn test_tool_errors_are_returned_as_text() {
        let temp = TempDir::new().unwrap();
        let server = FilesystemMcp::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            ..FilesystemConfig::default()
        })
        .unwrap();

        let result = server
            .read_file(Parameters(FilePathArgs {
                file_path: "missing.txt".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));

        let result = server
            .write_file(Parameters(WriteFileArgs {
                file_path: "hello.txt".to_string(),
                content: "hi".to_string(),
                create_dirs: false,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(
            std::fs::read_to_string(temp.path().join("hello.txt")).unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_resource_listing_json() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();
        let server = FilesystemMcp::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            ..FilesystemConfig::default()
        })
        .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&server.listing_json(".").unwrap()).unwrap();
        assert_eq!(json[0]["name"], "a.txt");
        assert!(server.listing_json("../").is_err());
    }

    #[test]
    fn test_resource_uris() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(temp.path().join("docs")).unwrap();
        std::fs::write(temp.path().join("docs/b.txt"), "b").unwrap();
        let server = FilesystemMcp::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            ..FilesystemConfig::default()
        })
        .unwrap();

        let listed = server.root_uri();
        assert!(listed.starts_with("file:////"));
        let root: serde_json::Value =
            serde_json::from_str(&server.resource_listing(&listed).unwrap()).unwrap();
        let empty: serde_json::Value =
            serde_json::from_str(&server.resource_listing("file:///").unwrap()).unwrap();
        assert_eq!(root, empty);
        assert_eq!(root.as_array().unwrap().len(), 2);

        let docs: serde_json::Value =
            serde_json::from_str(&server.resource_listing("file:///docs").unwrap()).unwrap();
        assert_eq!(docs[0]["name"], "b.txt");

        let err = server.resource_listing("http://example.com/").unwrap_err();
        assert_eq!(err.code.0, ErrorCode::INVALID_PARAMS.0);

        let err = server.resource_listing("file:///../").unwrap_err();
        assert_eq!(err.code.0, ErrorCode::RESOURCE_NOT_FOUND.0);
    }
}

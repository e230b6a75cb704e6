// file: src/models/filesystem.rs
// description: Result payloads returned by the sandboxed filesystem operations
// reference: serialized verbatim as MCP tool output

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Error,
}

/// One row of a directory listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirEntryInfo {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,

    /// Only present for regular files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DirEntryInfo {
    pub fn failed(name: String, error: String) -> Self {
        Self {
            name,
            path: None,
            kind: EntryKind::Error,
            modified: None,
            size: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
    pub size: u64,
    pub modified: String,
    pub encoding: TextEncoding,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineMatch {
    pub line_number: usize,
    pub line: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub file: String,
    pub search_string: String,
    pub case_sensitive: bool,
    pub total_matches: usize,
    pub matches: Vec<LineMatch>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    Created,
    Overwritten,
    Appended,
    Updated,
    Deleted,
}

/// Metadata returned after a file was written, appended to or updated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub path: String,
    pub operation: FileOperation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacements: Option<usize>,

    pub size: u64,
    pub modified: String,
}

/// Metadata returned by delete and create-directory operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathOutcome {
    pub path: String,
    pub operation: FileOperation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,

    pub timestamp: String,
}

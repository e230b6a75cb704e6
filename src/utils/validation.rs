// file: src/utils/validation.rs
// description: input validation helpers shared by config, RAG loading and the CLI
// reference: input validation patterns

use crate::error::{Result, ToolkitError};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ToolkitError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(ToolkitError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !Self::is_http_url(url) {
            return Err(ToolkitError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    pub fn is_http_url(value: &str) -> bool {
        value.starts_with("http://") || value.starts_with("https://")
    }

    pub fn validate_port(port: u16) -> Result<()> {
        if port == 0 {
            return Err(ToolkitError::Validation("Port cannot be 0".to_string()));
        }
        Ok(())
    }

    pub fn validate_batch_size(size: usize) -> Result<()> {
        if size == 0 {
            return Err(ToolkitError::Validation(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if size > 2048 {
            return Err(ToolkitError::Validation(
                "Batch size too large (max 2048)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_not_blank(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ToolkitError::InvalidInput(format!("{} cannot be empty", field)));
        }
        Ok(())
    }

    /// Truncates on a char boundary, appending `...` when shortened.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            None => text.to_string(),
            Some((idx, _)) => format!("{}...", &text[..idx]),
        }
    }
}

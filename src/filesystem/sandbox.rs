// file: src/filesystem/sandbox.rs
// description: Confines every requested path to the configured base directory
// reference: path canonicalization and traversal checks

use crate::config::FilesystemConfig;
use crate::error::{Result, ToolkitError};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
pub struct Sandbox {
    base_dir: PathBuf,
    allow_write: bool,
    allow_delete: bool,
    max_file_size: u64,
}

impl Sandbox {
    pub fn new(config: &FilesystemConfig) -> Result<Self> {
        let base_dir = fs::canonicalize(&config.base_dir).map_err(|e| {
            ToolkitError::Config(format!(
                "Cannot resolve base directory {}: {}",
                config.base_dir.display(),
                e
            ))
        })?;

        if !base_dir.is_dir() {
            return Err(ToolkitError::Config(format!(
                "Base directory is not a directory: {}",
                base_dir.display()
            )));
        }

        Ok(Self {
            base_dir,
            allow_write: config.allow_write,
            allow_delete: config.allow_delete,
            max_file_size: config.max_file_size_bytes,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn allows_write(&self) -> bool {
        self.allow_write
    }

    pub fn allows_delete(&self) -> bool {
        self.allow_delete
    }

    /// Maps a user supplied path onto an absolute path inside the base
    /// directory. Symlinks in the existing part of the path are resolved
    /// before the containment check.
    pub fn resolve(&self, input: &str) -> Result<PathBuf> {
        let requested = expand_home(input.trim());
        let joined = if requested.is_absolute() {
            requested
        } else {
            self.base_dir.join(requested)
        };

        let resolved = canonicalize_existing_prefix(&normalize_lexically(&joined))
            .map_err(|e| ToolkitError::AccessDenied(format!("Cannot resolve path {}: {}", input, e)))?;

        if !resolved.starts_with(&self.base_dir) {
            return Err(ToolkitError::AccessDenied(format!(
                "Path traversal attempt detected - {} is outside {}",
                resolved.display(),
                self.base_dir.display()
            )));
        }

        debug!("Resolved {} -> {}", input, resolved.display());
        Ok(resolved)
    }

    /// Path relative to the base directory, `.` for the base itself
    pub fn relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.base_dir) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }

    pub fn check_write(&self) -> Result<()> {
        if !self.allow_write {
            return Err(ToolkitError::PermissionDenied(
                "Write operations are disabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn check_delete(&self) -> Result<()> {
        if !self.allow_delete {
            return Err(ToolkitError::PermissionDenied(
                "Delete operations are disabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn check_file_size(&self, size: u64) -> Result<()> {
        if size > self.max_file_size {
            return Err(ToolkitError::TooLarge(format!(
                "File exceeds maximum size of {}",
                self.limit_label()
            )));
        }
        Ok(())
    }

    pub fn check_content_size(&self, content: &str) -> Result<()> {
        if content.len() as u64 > self.max_file_size {
            return Err(ToolkitError::TooLarge(format!(
                "Content exceeds maximum size of {}",
                self.limit_label()
            )));
        }
        Ok(())
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    fn limit_label(&self) -> String {
        let mb = self.max_file_size as f64 / 1024.0 / 1024.0;
        if mb.fract() == 0.0 {
            format!("{}MB", mb as u64)
        } else {
            format!("{:.2}MB", mb)
        }
    }
}

fn expand_home(input: &str) -> PathBuf {
    if input == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = input.strip_prefix("~/").or_else(|| input.strip_prefix("~\\"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }

    PathBuf::from(input)
}

/// Collapses `.` and `..` without touching the filesystem. `..` never climbs
/// above the root.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalizes the deepest ancestor that exists and re-appends the rest,
/// so paths to files that are about to be created can still be checked.
/// Dangling symlinks count as existing and are followed to their target.
fn canonicalize_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    resolve_links(path, 0)
}

fn resolve_links(path: &Path, hops: usize) -> io::Result<PathBuf> {
    if hops > MAX_LINK_HOPS {
        return Err(io::Error::other("Too many levels of symbolic links"));
    }

    let mut existing = path.to_path_buf();
    let mut missing = Vec::new();

    // symlink_metadata does not follow links
    while fs::symlink_metadata(&existing).is_err() {
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name.to_owned());
                existing = parent.to_path_buf();
            }
            _ => break,
        }
    }

    let mut resolved = match fs::canonicalize(&existing) {
        Ok(path) => path,
        Err(_) if is_symlink(&existing) => {
            let target = fs::read_link(&existing)?;
            let target = match existing.parent() {
                Some(parent) if target.is_relative() => fs::canonicalize(parent)?.join(target),
                _ => target,
            };
            resolve_links(&normalize_lexically(&target), hops + 1)?
        }
        Err(e) => return Err(e),
    };

    for part in missing.iter().rev() {
        resolved.push(part);
    }
    Ok(resolved)
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

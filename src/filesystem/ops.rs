// file: src/filesystem/ops.rs
// description: CRUD operations over the sandboxed base directory
// reference: https://doc.rust-lang.org/std/fs/

use crate::config::FilesystemConfig;
use crate::error::{Result, ToolkitError};
use crate::filesystem::encoding::decode_with_fallback;
use crate::filesystem::sandbox::Sandbox;
use crate::models::{
    DirEntryInfo, EntryKind, FileContent, FileOperation, LineMatch, PathOutcome, SearchOutcome,
    WriteOutcome,
};
use chrono::{DateTime, Local};
use regex::{NoExpand, RegexBuilder};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info};

/// Read, write, search and delete files below one base directory.
///
/// Every method resolves its path argument through the [`Sandbox`] first, so
/// nothing outside the base directory is ever touched.
#[derive(Debug, Clone)]
pub struct FileManager {
    sandbox: Sandbox,
    max_search_results: usize,
}

impl FileManager {
    pub fn new(config: &FilesystemConfig) -> Result<Self> {
        Ok(Self {
            sandbox: Sandbox::new(config)?,
            max_search_results: config.max_search_results,
        })
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn list_directory(&self, directory_path: &str) -> Result<Vec<DirEntryInfo>> {
        let safe_path = self.sandbox.resolve(directory_path)?;

        if !safe_path.exists() {
            return Err(ToolkitError::NotFound(format!(
                "Directory not found: {}",
                directory_path
            )));
        }

        if !safe_path.is_dir() {
            return Err(ToolkitError::InvalidInput(format!(
                "Path is not a directory: {}",
                directory_path
            )));
        }

        let mut items = Vec::new();

        for entry in fs::read_dir(&safe_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let entry_path = entry.path();

            match fs::metadata(&entry_path) {
                Ok(metadata) => {
                    let is_dir = metadata.is_dir();
                    items.push(DirEntryInfo {
                        name,
                        path: Some(self.sandbox.relative(&entry_path)),
                        kind: if is_dir {
                            EntryKind::Directory
                        } else {
                            EntryKind::File
                        },
                        modified: metadata.modified().ok().map(iso_timestamp),
                        size: metadata.is_file().then(|| metadata.len()),
                        error: None,
                    });
                }
                Err(e) => items.push(DirEntryInfo::failed(name, e.to_string())),
            }
        }

        items.sort_by_key(|item| (item.kind != EntryKind::Directory, item.name.to_lowercase()));

        debug!("Listed {} entries in {}", items.len(), safe_path.display());
        Ok(items)
    }

    pub fn read_file(&self, file_path: &str) -> Result<FileContent> {
        let safe_path = self.existing_file(file_path)?;
        let metadata = fs::metadata(&safe_path)?;
        self.sandbox.check_file_size(metadata.len())?;

        let (content, encoding) = decode_with_fallback(fs::read(&safe_path)?);

        Ok(FileContent {
            path: self.sandbox.relative(&safe_path),
            content,
            size: metadata.len(),
            modified: modified_of(&safe_path)?,
            encoding,
        })
    }

    pub fn search_file(
        &self,
        file_path: &str,
        search_string: &str,
        case_sensitive: bool,
    ) -> Result<SearchOutcome> {
        let safe_path = self.existing_file(file_path)?;
        self.sandbox.check_file_size(fs::metadata(&safe_path)?.len())?;

        let (content, _) = decode_with_fallback(fs::read(&safe_path)?);

        let needle = if case_sensitive {
            search_string.to_string()
        } else {
            search_string.to_lowercase()
        };

        // \r\n, \n and a lone \r all end a line
        let content = content.replace("\r\n", "\n").replace('\r', "\n");

        let mut matches = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let hit = if case_sensitive {
                line.contains(&needle)
            } else {
                line.to_lowercase().contains(&needle)
            };

            if hit {
                matches.push(LineMatch {
                    line_number: idx + 1,
                    line: line.trim().to_string(),
                });

                if matches.len() >= self.max_search_results {
                    break;
                }
            }
        }

        Ok(SearchOutcome {
            file: self.sandbox.relative(&safe_path),
            search_string: search_string.to_string(),
            case_sensitive,
            total_matches: matches.len(),
            matches,
        })
    }

    pub fn write_file(&self, file_path: &str, content: &str, create_dirs: bool) -> Result<WriteOutcome> {
        self.sandbox.check_write()?;

        let safe_path = self.sandbox.resolve(file_path)?;
        self.sandbox.check_content_size(content)?;

        if let Some(parent) = safe_path.parent() {
            if create_dirs {
                fs::create_dir_all(parent)?;
            } else if !parent.exists() {
                return Err(ToolkitError::NotFound(format!(
                    "Parent directory does not exist: {}",
                    self.sandbox.relative(parent)
                )));
            }
        }

        let existed = safe_path.exists();
        fs::write(&safe_path, content)?;

        info!("Wrote {} bytes to {}", content.len(), safe_path.display());
        self.write_outcome(
            &safe_path,
            if existed {
                FileOperation::Overwritten
            } else {
                FileOperation::Created
            },
            None,
        )
    }

    pub fn append_file(&self, file_path: &str, content: &str) -> Result<WriteOutcome> {
        self.sandbox.check_write()?;

        let safe_path = self.existing_file(file_path)?;

        let current_size = fs::metadata(&safe_path)?.len();
        if current_size + content.len() as u64 > self.sandbox.max_file_size() {
            return Err(ToolkitError::TooLarge(
                "Appending would exceed maximum file size".to_string(),
            ));
        }

        let mut file = OpenOptions::new().append(true).open(&safe_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        info!("Appended {} bytes to {}", content.len(), safe_path.display());
        self.write_outcome(&safe_path, FileOperation::Appended, None)
    }

    /// Replaces occurrences of `search_string`. `max_replacements` of `None`
    /// or `Some(0)` means unlimited; the reported count is the number of
    /// matches found, capped at the limit.
    pub fn update_file(
        &self,
        file_path: &str,
        search_string: &str,
        replace_string: &str,
        case_sensitive: bool,
        max_replacements: Option<usize>,
    ) -> Result<WriteOutcome> {
        self.sandbox.check_write()?;

        if search_string.is_empty() {
            return Err(ToolkitError::InvalidInput(
                "search_string cannot be empty".to_string(),
            ));
        }

        let safe_path = self.existing_file(file_path)?;
        self.sandbox.check_file_size(fs::metadata(&safe_path)?.len())?;

        let (content, _) = decode_with_fallback(fs::read(&safe_path)?);
        let limit = max_replacements.filter(|&n| n > 0);

        let (updated, found) = if case_sensitive {
            let found = content.matches(search_string).count();
            let updated = match limit {
                Some(n) => content.replacen(search_string, replace_string, n),
                None => content.replace(search_string, replace_string),
            };
            (updated, found)
        } else {
            let pattern = RegexBuilder::new(&regex::escape(search_string))
                .case_insensitive(true)
                .build()
                .map_err(|e| ToolkitError::InvalidInput(e.to_string()))?;
            let found = pattern.find_iter(&content).count();
            let updated = pattern
                .replacen(&content, limit.unwrap_or(0), NoExpand(replace_string))
                .into_owned();
            (updated, found)
        };

        self.sandbox.check_content_size(&updated)?;
        fs::write(&safe_path, &updated)?;

        let replacements = limit.map_or(found, |n| found.min(n));
        info!(
            "Updated {} ({} replacements)",
            safe_path.display(),
            replacements
        );
        self.write_outcome(&safe_path, FileOperation::Updated, Some(replacements))
    }

    pub fn delete_file(&self, file_path: &str) -> Result<PathOutcome> {
        self.sandbox.check_delete()?;

        let safe_path = self.existing_file(file_path)?;
        let relative = self.sandbox.relative(&safe_path);
        fs::remove_file(&safe_path)?;

        info!("Deleted file {}", safe_path.display());
        Ok(PathOutcome {
            path: relative,
            operation: FileOperation::Deleted,
            recursive: None,
            kind: None,
            timestamp: now_timestamp(),
        })
    }

    pub fn delete_directory(&self, directory_path: &str, recursive: bool) -> Result<PathOutcome> {
        self.sandbox.check_delete()?;

        let safe_path = self.sandbox.resolve(directory_path)?;

        if !safe_path.exists() {
            return Err(ToolkitError::NotFound(format!(
                "Directory not found: {}",
                directory_path
            )));
        }

        if !safe_path.is_dir() {
            return Err(ToolkitError::InvalidInput(format!(
                "Path is not a directory: {}",
                directory_path
            )));
        }

        if safe_path == self.sandbox.base_dir() {
            return Err(ToolkitError::PermissionDenied(
                "Cannot delete base directory".to_string(),
            ));
        }

        let relative = self.sandbox.relative(&safe_path);

        if recursive {
            fs::remove_dir_all(&safe_path)?;
        } else {
            if fs::read_dir(&safe_path)?.next().is_some() {
                return Err(ToolkitError::InvalidInput(
                    "Directory not empty. Use recursive=true to delete non-empty directories"
                        .to_string(),
                ));
            }
            fs::remove_dir(&safe_path)?;
        }

        info!("Deleted directory {} (recursive: {})", safe_path.display(), recursive);
        Ok(PathOutcome {
            path: relative,
            operation: FileOperation::Deleted,
            recursive: Some(recursive),
            kind: None,
            timestamp: now_timestamp(),
        })
    }

    pub fn create_directory(&self, directory_path: &str, parents: bool) -> Result<PathOutcome> {
        self.sandbox.check_write()?;

        let safe_path = self.sandbox.resolve(directory_path)?;

        if safe_path.exists() {
            return Err(ToolkitError::InvalidInput(format!(
                "Path already exists: {}",
                directory_path
            )));
        }

        if parents {
            fs::create_dir_all(&safe_path)?;
        } else {
            fs::create_dir(&safe_path)?;
        }

        info!("Created directory {}", safe_path.display());
        Ok(PathOutcome {
            path: self.sandbox.relative(&safe_path),
            operation: FileOperation::Created,
            recursive: None,
            kind: Some(EntryKind::Directory),
            timestamp: now_timestamp(),
        })
    }

    fn existing_file(&self, file_path: &str) -> Result<std::path::PathBuf> {
        let safe_path = self.sandbox.resolve(file_path)?;

        if !safe_path.exists() {
            return Err(ToolkitError::NotFound(format!("File not found: {}", file_path)));
        }

        if !safe_path.is_file() {
            return Err(ToolkitError::InvalidInput(format!(
                "Path is not a file: {}",
                file_path
            )));
        }

        Ok(safe_path)
    }

    fn write_outcome(
        &self,
        path: &Path,
        operation: FileOperation,
        replacements: Option<usize>,
    ) -> Result<WriteOutcome> {
        let metadata = fs::metadata(path)?;
        Ok(WriteOutcome {
            path: self.sandbox.relative(path),
            operation,
            replacements,
            size: metadata.len(),
            modified: modified_of(path)?,
        })
    }
}

fn modified_of(path: &Path) -> Result<String> {
    Ok(iso_timestamp(fs::metadata(path)?.modified()?))
}

fn iso_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn now_timestamp() -> String {
    iso_timestamp(SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn manager(temp: &TempDir) -> FileManager {
        FileManager::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            ..FilesystemConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_list_directory_sorts_directories_first() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.txt"), "bb").unwrap();
        fs::write(temp.path().join("A.txt"), "a").unwrap();
        fs::create_dir(temp.path().join("zdir")).unwrap();

        let items = manager(&temp).list_directory(".").unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["zdir", "A.txt", "b.txt"]);
        assert_eq!(items[0].kind, EntryKind::Directory);
        assert_eq!(items[0].size, None);
        assert_eq!(items[2].size, Some(2));
        assert_eq!(items[2].path.as_deref(), Some("b.txt"));
    }

    #[test]
    fn test_list_directory_errors() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f.txt"), "x").unwrap();
        let fm = manager(&temp);

        assert_eq!(
            fm.list_directory("missing").unwrap_err().to_string(),
            "Directory not found: missing"
        );
        assert_eq!(
            fm.list_directory("f.txt").unwrap_err().to_string(),
            "Path is not a directory: f.txt"
        );
    }

    #[test]
    fn test_read_file_with_latin1_fallback() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("utf.txt"), "héllo").unwrap();
        fs::write(temp.path().join("latin.txt"), [0x63, 0x61, 0x66, 0xe9]).unwrap();
        let fm = manager(&temp);

        let utf = fm.read_file("utf.txt").unwrap();
        assert_eq!(utf.content, "héllo");
        assert_eq!(utf.encoding, crate::models::TextEncoding::Utf8);

        let latin = fm.read_file("latin.txt").unwrap();
        assert_eq!(latin.content, "café");
        assert_eq!(latin.encoding, crate::models::TextEncoding::Latin1);
        assert_eq!(latin.size, 4);
    }

    #[test]
    fn test_search_file_case_insensitive_by_default() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("todo.md"),
            "first line\n  TODO: write tests  \nnothing\ntodo again\n",
        )
        .unwrap();
        let fm = manager(&temp);

        let outcome = fm.search_file("todo.md", "todo", false).unwrap();
        assert_eq!(outcome.total_matches, 2);
        assert_eq!(
            outcome.matches[0],
            LineMatch {
                line_number: 2,
                line: "TODO: write tests".to_string()
            }
        );
        assert_eq!(outcome.matches[1].line_number, 4);

        let sensitive = fm.search_file("todo.md", "TODO", true).unwrap();
        assert_eq!(sensitive.total_matches, 1);
    }

    #[test]
    fn test_search_counts_every_line_ending() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("mac.txt"), "alpha\rbeta\r\ngamma\nbeta again\r").unwrap();
        let fm = manager(&temp);

        let outcome = fm.search_file("mac.txt", "beta", true).unwrap();
        assert_eq!(
            outcome.matches,
            vec![
                LineMatch {
                    line_number: 2,
                    line: "beta".to_string()
                },
                LineMatch {
                    line_number: 4,
                    line: "beta again".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_search_stops_at_limit() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("many.txt"), "x\n".repeat(50)).unwrap();
        let fm = FileManager::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            max_search_results: 5,
            ..FilesystemConfig::default()
        })
        .unwrap();

        assert_eq!(fm.search_file("many.txt", "x", true).unwrap().total_matches, 5);
    }

    #[test]
    fn test_write_file_create_then_overwrite() {
        let temp = TempDir::new().unwrap();
        let fm = manager(&temp);

        let err = fm.write_file("nested/dir/out.txt", "data", false).unwrap_err();
        assert!(matches!(err, ToolkitError::NotFound(_)));

        let created = fm.write_file("nested/dir/out.txt", "data", true).unwrap();
        assert_eq!(created.operation, FileOperation::Created);
        assert_eq!(created.path, "nested/dir/out.txt");
        assert_eq!(created.size, 4);

        let overwritten = fm.write_file("nested/dir/out.txt", "more data", false).unwrap();
        assert_eq!(overwritten.operation, FileOperation::Overwritten);
        assert_eq!(
            fs::read_to_string(temp.path().join("nested/dir/out.txt")).unwrap(),
            "more data"
        );
    }

    #[test]
    fn test_append_file_respects_size_limit() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("log.txt"), "12345").unwrap();
        let fm = FileManager::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            max_file_size_bytes: 8,
            ..FilesystemConfig::default()
        })
        .unwrap();

        let outcome = fm.append_file("log.txt", "678").unwrap();
        assert_eq!(outcome.operation, FileOperation::Appended);
        assert_eq!(outcome.size, 8);

        assert_eq!(
            fm.append_file("log.txt", "9").unwrap_err().to_string(),
            "Appending would exceed maximum file size"
        );
        assert!(matches!(
            fm.append_file("nope.txt", "x"),
            Err(ToolkitError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_file_case_insensitive_with_limit() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("doc.txt"), "Foo foo FOO $1").unwrap();
        let fm = manager(&temp);

        let outcome = fm.update_file("doc.txt", "foo", "$bar", false, Some(2)).unwrap();
        assert_eq!(outcome.replacements, Some(2));
        assert_eq!(
            fs::read_to_string(temp.path().join("doc.txt")).unwrap(),
            "$bar $bar FOO $1"
        );
    }

    #[test]
    fn test_update_file_case_sensitive_unlimited() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("doc.txt"), "a-a-A").unwrap();
        let fm = manager(&temp);

        let outcome = fm.update_file("doc.txt", "a", "b", true, None).unwrap();
        assert_eq!(outcome.replacements, Some(2));
        assert_eq!(fs::read_to_string(temp.path().join("doc.txt")).unwrap(), "b-b-A");

        assert!(matches!(
            fm.update_file("doc.txt", "", "x", true, None),
            Err(ToolkitError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_delete_file_and_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("full/inner")).unwrap();
        fs::create_dir(temp.path().join("empty")).unwrap();
        fs::write(temp.path().join("full/inner/f.txt"), "x").unwrap();
        fs::write(temp.path().join("gone.txt"), "x").unwrap();
        let fm = manager(&temp);

        let outcome = fm.delete_file("gone.txt").unwrap();
        assert_eq!(outcome.path, "gone.txt");
        assert!(!temp.path().join("gone.txt").exists());

        assert!(fm.delete_directory("empty", false).is_ok());

        let err = fm.delete_directory("full", false).unwrap_err();
        assert!(err.to_string().starts_with("Directory not empty"));

        let outcome = fm.delete_directory("full", true).unwrap();
        assert_eq!(outcome.recursive, Some(true));
        assert!(!temp.path().join("full").exists());

        assert_eq!(
            fm.delete_directory(".", true).unwrap_err().to_string(),
            "Cannot delete base directory"
        );
    }

    #[test]
    fn test_create_directory() {
        let temp = TempDir::new().unwrap();
        let fm = manager(&temp);

        assert!(fm.create_directory("a/b", false).is_err());
        let outcome = fm.create_directory("a/b", true).unwrap();
        assert_eq!(outcome.path, "a/b");
        assert_eq!(outcome.kind, Some(EntryKind::Directory));
        assert_eq!(
            fm.create_directory("a", false).unwrap_err().to_string(),
            "Path already exists: a"
        );
    }

    #[test]
    fn test_disabled_operations() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("keep.txt"), "x").unwrap();
        let fm = FileManager::new(&FilesystemConfig {
            base_dir: temp.path().to_path_buf(),
            allow_write: false,
            allow_delete: false,
            ..FilesystemConfig::default()
        })
        .unwrap();

        assert!(matches!(
            fm.write_file("new.txt", "x", false),
            Err(ToolkitError::PermissionDenied(_))
        ));
        assert!(matches!(
            fm.delete_file("keep.txt"),
            Err(ToolkitError::PermissionDenied(_))
        ));
        assert!(fm.read_file("keep.txt").is_ok());
    }
}

// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{Result, ToolkitError};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment names understood by the standalone tools this crate replaces.
/// Each maps onto a config key and wins over file and prefixed values.
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("MCP_BASE_DIR", "filesystem.base_dir"),
    ("MCP_ALLOW_WRITE", "filesystem.allow_write"),
    ("MCP_ALLOW_DELETE", "filesystem.allow_delete"),
    ("BASE_URL", "chat.base_url"),
    ("MODEL_NAME", "chat.model"),
    ("API_KEY", "chat.api_key"),
    ("MAX_TOKENS", "chat.max_tokens"),
    ("TEMPERATURE", "chat.temperature"),
    ("FLASK_HOST", "chat.host"),
    ("FLASK_PORT", "chat.port"),
    // later entries win when both names are set
    ("CHAT_HOST", "chat.host"),
    ("CHAT_PORT", "chat.port"),
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub filesystem: FilesystemConfig,
    pub shell: ShellConfig,
    pub chat: ChatConfig,
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilesystemConfig {
    pub base_dir: PathBuf,
    pub allow_write: bool,
    pub allow_delete: bool,
    pub max_file_size_bytes: u64,
    pub max_search_results: usize,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            allow_write: true,
            allow_delete: true,
            max_file_size_bytes: 10 * 1024 * 1024,
            max_search_results: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellConfig {
    pub default_timeout_secs: u64,
    pub git_bash_path: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            git_bash_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub request_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:12434/engines/llama.cpp/v1".to_string(),
            model: "ai/smollm2".to_string(),
            api_key: "not-needed".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: PathBuf::from("."),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub embedding_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 384,
            embedding_batch_size: 32,
        }
    }
}

impl Config {
    /// File, then `AGENT_TOOLKIT__*`, then legacy names. Any unparsable or
    /// invalid value is an error; nothing falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();
        Self::load_with_env(path, std::env::vars().collect())
    }

    fn load_with_env(path: Option<&Path>, env: config::Map<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(
                config::File::from(Path::new("config/default.toml")).required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("AGENT_TOOLKIT")
                .separator("__")
                .try_parsing(true)
                .source(Some(env.clone())),
        );

        for (var, key) in LEGACY_ENV_OVERRIDES {
            builder = builder
                .set_override_option(*key, env.get(*var).cloned())
                .map_err(|e| ToolkitError::Config(e.to_string()))?;
        }

        let settings = builder
            .build()
            .map_err(|e| ToolkitError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| ToolkitError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.filesystem.max_file_size_bytes == 0 {
            return Err(ToolkitError::Config(
                "max_file_size_bytes must be greater than 0".to_string(),
            ));
        }

        if self.filesystem.max_search_results == 0 {
            return Err(ToolkitError::Config(
                "max_search_results must be greater than 0".to_string(),
            ));
        }

        if self.shell.default_timeout_secs == 0 {
            return Err(ToolkitError::Config(
                "default_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Validator::validate_url(&self.chat.base_url)
            .map_err(|e| ToolkitError::Config(format!("chat.base_url: {}", e)))?;

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ToolkitError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.chat.temperature
            )));
        }

        Validator::validate_port(self.chat.port)
            .map_err(|e| ToolkitError::Config(format!("chat.port: {}", e)))?;

        if self.rag.chunk_size == 0 || self.rag.top_k == 0 || self.rag.embedding_dim == 0 {
            return Err(ToolkitError::Config(
                "chunk_size, top_k and embedding_dim must be greater than 0".to_string(),
            ));
        }

        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ToolkitError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }

        Validator::validate_batch_size(self.rag.embedding_batch_size)
            .map_err(|e| ToolkitError::Config(format!("embedding_batch_size: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.shell.default_timeout_secs, 30);
        assert_eq!(config.chat.model, "ai/smollm2");
        assert_eq!(config.filesystem.max_file_size_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_chunk() {
        let mut config = Config::default_config();
        config.rag.chunk_overlap = config.rag.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_temperature_and_url() {
        let mut config = Config::default_config();
        config.chat.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = Config::default_config();
        config.chat.base_url = "localhost:8080".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("toolkit.toml");
        fs::write(
            &path,
            "[chat]\nmodel = \"llama3\"\nport = 8088\n\n[rag]\ntop_k = 2\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.chat.model, "llama3");
        assert_eq!(config.chat.port, 8088);
        assert_eq!(config.rag.top_k, 2);
        assert_eq!(config.rag.chunk_size, 1000);
        assert!(config.filesystem.allow_write);
    }

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn empty_file(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("empty.toml");
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn test_legacy_env_names_override_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("toolkit.toml");
        fs::write(&path, "[chat]\nmodel = \"from-file\"\n").unwrap();

        let config = Config::load_with_env(
            Some(&path),
            env(&[
                ("MCP_BASE_DIR", "/srv/data"),
                ("MCP_ALLOW_WRITE", "false"),
                ("MCP_ALLOW_DELETE", "false"),
                ("MODEL_NAME", "llama3"),
                ("MAX_TOKENS", "64"),
                ("TEMPERATURE", "0.2"),
                ("FLASK_PORT", "8081"),
            ]),
        )
        .unwrap();

        assert_eq!(config.filesystem.base_dir, PathBuf::from("/srv/data"));
        assert!(!config.filesystem.allow_write);
        assert!(!config.filesystem.allow_delete);
        assert_eq!(config.chat.model, "llama3");
        assert_eq!(config.chat.max_tokens, 64);
        assert_eq!(config.chat.temperature, 0.2);
        assert_eq!(config.chat.port, 8081);
    }

    #[test]
    fn test_chat_names_win_over_flask_names() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_with_env(
            Some(&empty_file(&temp)),
            env(&[
                ("FLASK_HOST", "10.0.0.1"),
                ("CHAT_HOST", "127.0.0.1"),
                ("FLASK_PORT", "8081"),
            ]),
        )
        .unwrap();

        assert_eq!(config.chat.host, "127.0.0.1");
        assert_eq!(config.chat.port, 8081);
    }

    #[test]
    fn test_prefixed_env_is_read() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_with_env(
            Some(&empty_file(&temp)),
            env(&[("AGENT_TOOLKIT__RAG__TOP_K", "7")]),
        )
        .unwrap();
        assert_eq!(config.rag.top_k, 7);
    }

    #[test]
    fn test_bad_env_value_is_an_error_not_a_reset() {
        let temp = TempDir::new().unwrap();
        let path = empty_file(&temp);

        let unrelated = Config::load_with_env(
            Some(&path),
            env(&[("MCP_ALLOW_DELETE", "false"), ("TEMPERATURE", "5")]),
        );
        assert!(matches!(unrelated, Err(ToolkitError::Config(_))));

        let unparsable = Config::load_with_env(
            Some(&path),
            env(&[("MCP_ALLOW_WRITE", "false"), ("MCP_ALLOW_DELETE", "disabled")]),
        );
        assert!(unparsable.is_err());

        let valid = Config::load_with_env(Some(&path), env(&[("MCP_ALLOW_DELETE", "false")]))
            .unwrap();
        assert!(!valid.filesystem.allow_delete);
        assert!(valid.filesystem.allow_write);
    }
}

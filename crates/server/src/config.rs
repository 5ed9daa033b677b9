//! # Application Configuration
//!
//! Both services read the same flat set of options. They are loaded in layers:
//! serde defaults, then an optional `config.yml` (with `${VAR}` placeholders
//! substituted from the environment), then the process environment itself.
//! Options whose default differs between the two services (port, database)
//! stay optional here and are resolved against a [`Service`].

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
    /// The model provider key is unset or empty.
    MissingApiKey,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
            ConfigError::MissingApiKey => {
                write!(f, "OPENAI_API_KEY is required but was not set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// Which of the two backends a process is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    AntiTodo,
    Ownership,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::AntiTodo => "Anti-To-Do",
            Service::Ownership => "Ownership Resolution Assistant",
        }
    }

    fn default_port(&self) -> u16 {
        match self {
            Service::AntiTodo => 8000,
            Service::Ownership => 8001,
        }
    }

    fn default_database_url(&self) -> &'static str {
        match self {
            Service::AntiTodo => "anti_todo.db",
            Service::Ownership => "ownership_assistant.db",
        }
    }
}

/// The root configuration structure. Keys match the lowercased env names.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Loaded from `OPENAI_API_KEY`. Checked by [`get_config`].
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_api_url")]
    pub embedding_api_url: String,

    /// SQLite path; `sqlite:///` prefixes are accepted.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub langfuse_secret_key: Option<String>,
    #[serde(default)]
    pub langfuse_public_key: Option<String>,
    #[serde(default = "default_langfuse_host")]
    pub langfuse_host: String,

    #[serde(default)]
    pub chroma_persist_dir: Option<String>,
    /// Takes precedence over `chroma_persist_dir` when both are set.
    #[serde(default)]
    pub vector_store_path: Option<String>,
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
    #[serde(default = "default_min_confidence_score")]
    pub min_confidence_score: f64,
    #[serde(default = "default_api_v1_prefix")]
    pub api_v1_prefix: String,

    #[serde(default)]
    pub port: Option<u16>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_openai_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}
fn default_embedding_api_url() -> String {
    "https://api.openai.com/v1/embeddings".to_string()
}
fn default_langfuse_host() -> String {
    "https://cloud.langfuse.com".to_string()
}
fn default_retrieval_top_k() -> usize {
    5
}
fn default_min_confidence_score() -> f64 {
    0.7
}
fn default_api_v1_prefix() -> String {
    "/api/v1".to_string()
}

impl AppConfig {
    pub fn port_for(&self, service: Service) -> u16 {
        self.port.unwrap_or_else(|| service.default_port())
    }

    pub fn database_url_for(&self, service: Service) -> String {
        self.database_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| service.default_database_url().to_string())
    }

    pub fn vector_store_dir(&self) -> String {
        self.vector_store_path
            .clone()
            .or_else(|| self.chroma_persist_dir.clone())
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| "./chroma_db".to_string())
    }

    /// The route prefix without a trailing slash (`""` mounts at the root).
    pub fn route_prefix(&self) -> String {
        let trimmed = self.api_v1_prefix.trim().trim_end_matches('/');
        if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

// Helper to read a file and substitute `${VAR}` placeholders.
// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the configuration from an optional YAML file and the environment.
///
/// With `config_path_override` the file must exist; otherwise `config.yml`
/// next to this crate is used when present. Environment variables override
/// file values (`PORT` overrides `port`, and so on).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    let file_content = match config_path_override {
        Some(path) => Some(read_and_substitute(path)?.ok_or_else(|| {
            ConfigError::NotFound(format!("Config file not found at '{path}'."))
        })?),
        None => {
            let default_path = format!("{}/config.yml", env!("CARGO_MANIFEST_DIR"));
            let content = read_and_substitute(&default_path)?;
            if content.is_some() {
                info!("Loading configuration from '{default_path}'.");
            }
            content
        }
    };
    if let Some(content) = file_content {
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    let settings = builder.add_source(Environment::default()).build()?;
    let config: AppConfig = settings.try_deserialize()?;

    if config
        .openai_api_key
        .as_deref()
        .map_or(true, |key| key.trim().is_empty())
    {
        return Err(ConfigError::MissingApiKey);
    }

    Ok(config)
}

//! Configuration management for docchat.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Config file (`.docchat/config.yaml` or `DOCCHAT_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. Nothing here talks to the network; validation only
//! checks that the settings needed before the first pipeline stage exist.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::retry::RetryPolicy;

/// Default number of fragments retrieved per question.
pub const DEFAULT_TOP_K: usize = 4;

/// Providers with a completion client.
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Providers with an embedding client.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Completion model used when a provider has no `llm.providers` entry.
pub fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "ollama" => "llama3.2",
        _ => "gpt-3.5-turbo",
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Completion provider (e.g., "openai", "ollama")
    pub provider: String,

    /// Completion model identifier
    pub model: String,

    /// Embedding provider (e.g., "openai", "ollama", "mock")
    pub embedding_provider: String,

    /// API key override for the completion and embedding providers
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// Vector index settings
    pub index: IndexConfig,

    /// Retrieval settings
    pub retrieval: RetrievalConfig,

    /// Retry policy applied to every upstream call
    pub retry: RetryPolicy,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
        #[serde(rename = "organizationEnv")]
        organization_env: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Completion model for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } => model,
            Self::Ollama { model, .. } => model,
        }
    }

    /// Embedding model, if configured.
    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            Self::OpenAI {
                embedding_model, ..
            } => embedding_model.as_deref(),
            Self::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }

    /// Custom endpoint, if configured.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// HTTP timeout in seconds, if configured.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::OpenAI { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }
}

/// Which vector index implementation to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Hosted Pinecone index over its REST API
    #[default]
    Pinecone,
    /// Local SQLite file with stored embeddings
    Sqlite,
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: IndexBackend,

    /// Index name; required before any request runs
    #[serde(default)]
    pub name: Option<String>,

    /// Pinecone index host (e.g. https://docs-abc123.svc.pinecone.io)
    #[serde(default)]
    pub host: Option<String>,

    /// Environment variable holding the Pinecone API key
    #[serde(rename = "apiKeyEnv", default = "default_index_api_key_env")]
    pub api_key_env: String,

    /// Metadata key that stores the fragment text
    #[serde(rename = "textKey", default = "default_text_key")]
    pub text_key: String,

    /// Optional Pinecone namespace
    #[serde(default)]
    pub namespace: Option<String>,

    /// SQLite index file (defaults to .docchat/index/<name>.sqlite)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_index_api_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}

fn default_text_key() -> String {
    "text".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            name: None,
            host: None,
            api_key_env: default_index_api_key_env(),
            text_key: default_text_key(),
            namespace: None,
            path: None,
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    index: Option<IndexConfig>,
    retrieval: Option<RetrievalConfig>,
    retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            embedding_provider: "openai".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            llm: None,
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `DOCCHAT_WORKSPACE`: Override workspace path
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `DOCCHAT_PROVIDER`: Completion provider
    /// - `DOCCHAT_MODEL`: Completion model
    /// - `DOCCHAT_EMBEDDING_PROVIDER`: Embedding provider
    /// - `DOCCHAT_API_KEY`: API key
    /// - `DOCCHAT_INDEX_NAME` (or `PINECONE_INDEX_NAME`): Vector index name
    /// - `DOCCHAT_TOP_K`: Fragments per question
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// wins over `DOCCHAT_WORKSPACE` / `DOCCHAT_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("DOCCHAT_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        if let Some(config_file) =
            config_file.or_else(|| std::env::var("DOCCHAT_CONFIG").ok().map(PathBuf::from))
        {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.docchat_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env()
    }

    /// Environment variables override the YAML config.
    fn apply_env(mut self) -> AppResult<Self> {
        if let Ok(provider) = std::env::var("DOCCHAT_PROVIDER") {
            self.switch_provider(provider);
        }

        if let Ok(model) = std::env::var("DOCCHAT_MODEL") {
            self.model = model;
        }

        if let Ok(provider) = std::env::var("DOCCHAT_EMBEDDING_PROVIDER") {
            self.embedding_provider = provider;
        }

        if let Ok(key) = std::env::var("DOCCHAT_API_KEY") {
            self.api_key = Some(key);
        }

        if let Some(name) = std::env::var("DOCCHAT_INDEX_NAME")
            .or_else(|_| std::env::var("PINECONE_INDEX_NAME"))
            .ok()
        {
            self.index.name = Some(name);
        }

        if let Ok(top_k) = std::env::var("DOCCHAT_TOP_K") {
            self.retrieval.top_k = top_k.parse().map_err(|_| {
                AppError::Config(format!("DOCCHAT_TOP_K must be a positive integer: {}", top_k))
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(self)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.merge(config_file))
    }

    fn merge(mut self, config_file: ConfigFile) -> Self {
        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            self.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.log_json = json;
            }
        }

        if let Some(llm) = config_file.llm {
            self.provider = llm.active_provider.clone();
            self.embedding_provider = llm.active_embedding_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                self.model = provider_config.model().to_string();
            }

            self.llm = Some(llm);
        }

        if let Some(index) = config_file.index {
            self.index = index;
        }

        if let Some(retrieval) = config_file.retrieval {
            self.retrieval = retrieval;
        }

        if let Some(retry) = config_file.retry {
            self.retry = retry;
        }

        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.switch_provider(provider);
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Make `provider` the completion provider.
    ///
    /// The model is reset to the provider's configured model, or its default
    /// when `llm.providers` has no entry. An embedding provider that was tied
    /// to the old completion provider moves with it; an explicitly different
    /// one (e.g. `mock`) is kept. A later model override still wins.
    pub fn switch_provider(&mut self, provider: String) {
        if provider == self.provider {
            return;
        }

        self.model = match self.get_provider_config(&provider) {
            Some(provider_config) => provider_config.model().to_string(),
            None => default_model_for(&provider).to_string(),
        };

        if self.embedding_provider == self.provider {
            self.embedding_provider = provider.clone();
        }

        self.provider = provider;
    }

    /// Get the path to the .docchat directory.
    pub fn docchat_dir(&self) -> PathBuf {
        self.workspace.join(".docchat")
    }

    /// Directory holding prompt template overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.docchat_dir().join("prompts")
    }

    /// Get the configuration for a named provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the API key for a provider.
    ///
    /// `DOCCHAT_API_KEY` wins; otherwise the provider's `apiKeyEnv` is read,
    /// falling back to `OPENAI_API_KEY` for OpenAI.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "openai" => std::env::var("OPENAI_API_KEY").ok(),
            None => None,
        }
    }

    /// The configured index name, or a configuration error.
    pub fn index_name(&self) -> AppResult<&str> {
        self.index
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "Missing vector index name. Set index.name in config.yaml or DOCCHAT_INDEX_NAME"
                        .to_string(),
                )
            })
    }

    /// Path of the SQLite index file for the `sqlite` backend.
    pub fn sqlite_index_path(&self) -> AppResult<PathBuf> {
        if let Some(ref path) = self.index.path {
            return Ok(if path.is_absolute() {
                path.clone()
            } else {
                self.workspace.join(path)
            });
        }

        let name = self.index_name()?;
        Ok(self
            .docchat_dir()
            .join("index")
            .join(format!("{}.sqlite", name)))
    }

    /// Validate the settings needed before any pipeline stage runs.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        self.index_name()?;

        if self.index.backend == IndexBackend::Pinecone && self.index.host.is_none() {
            return Err(AppError::Config(
                "Pinecone backend requires index.host".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

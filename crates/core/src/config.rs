//! Configuration management for docchat.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`.docchat/config.yaml` in the workspace, or `DOCCHAT_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Credentials are never stored in the file itself; the file names the
//! environment variable that holds each key.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Generation providers known to the LLM factory.
pub const KNOWN_GENERATION_PROVIDERS: [&str; 3] = ["groq", "openai", "ollama"];

/// Embedding providers known to the knowledge crate.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Flat folder of source documents to index
    pub documents_dir: PathBuf,

    /// Optional directory of prompt overrides
    pub prompts_dir: Option<PathBuf>,

    /// Generation service settings
    pub generation: GenerationSettings,

    /// Embedding service settings
    pub embedding: EmbeddingSettings,

    /// Speech-to-text settings
    pub transcription: TranscriptionSettings,

    /// Optional text-to-speech settings
    pub synthesis: Option<SynthesisSettings>,

    /// Chunking and retrieval settings
    pub retrieval: RetrievalSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Generation (chat completion) service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Provider name: "groq", "openai" or "ollama"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[serde(rename = "apiKeyEnv", default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(rename = "maxTokens", default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// HTTP request timeout in seconds
    #[serde(rename = "timeoutSecs", default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            endpoint: None,
            api_key_env: Some("GROQ_API_KEY".to_string()),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: None,
        }
    }
}

/// Embedding service settings. The same settings embed the corpus and queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Embedding vector dimension
    pub dimensions: usize,

    /// Base URL override (ollama)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Speech-to-text service settings (OpenAI-compatible transcription API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    /// Base URL of the OpenAI-compatible API
    pub endpoint: String,

    /// Transcription model
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "apiKeyEnv", default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(rename = "timeoutSecs", default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            model: "whisper-large-v3".to_string(),
            api_key_env: Some("GROQ_API_KEY".to_string()),
            timeout_secs: None,
        }
    }
}

/// Text-to-speech service settings (OpenAI-compatible speech API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Base URL of the OpenAI-compatible API
    pub endpoint: String,

    /// Speech model
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "apiKeyEnv", default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Voice per language code ("en", "hi", "ta", "te")
    #[serde(default)]
    pub voices: HashMap<String, String>,

    /// Voice used when a language has no entry in `voices`
    #[serde(rename = "defaultVoice", default = "default_voice")]
    pub default_voice: String,

    /// HTTP request timeout in seconds
    #[serde(rename = "timeoutSecs", default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_voice() -> String {
    "alloy".to_string()
}

/// Chunking and retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Number of chunks handed to the composer
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,

    /// Target chunk length in characters
    #[serde(rename = "chunkSize", default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(rename = "chunkOverlap", default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    documents: Option<String>,
    prompts: Option<String>,
    generation: Option<GenerationSettings>,
    embedding: Option<EmbeddingSettings>,
    transcription: Option<TranscriptionSettings>,
    synthesis: Option<SynthesisSettings>,
    retrieval: Option<RetrievalSettings>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            documents_dir: workspace.join("documents"),
            workspace,
            config_file: None,
            prompts_dir: None,
            generation: GenerationSettings::default(),
            embedding: EmbeddingSettings::default(),
            transcription: TranscriptionSettings::default(),
            synthesis: None,
            retrieval: RetrievalSettings::default(),
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Environment variables:
    /// - `DOCCHAT_WORKSPACE`: Override workspace path
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `DOCCHAT_DOCUMENTS`: Documents folder
    /// - `DOCCHAT_PROVIDER`: Generation provider
    /// - `DOCCHAT_MODEL`: Generation model
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Documents: {:?}", config.documents_dir);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Explicit paths take precedence over `DOCCHAT_WORKSPACE` and
    /// `DOCCHAT_CONFIG`; the rest of the layering is the same as [`AppConfig::load`].
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace = workspace.or_else(|| std::env::var("DOCCHAT_WORKSPACE").ok().map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
            config.documents_dir = config.workspace.join("documents");
        }

        let config_file = config_file.or_else(|| std::env::var("DOCCHAT_CONFIG").ok().map(PathBuf::from));
        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.config_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(documents) = std::env::var("DOCCHAT_DOCUMENTS") {
            config.documents_dir = config.resolve_path(&documents);
        }

        if let Ok(provider) = std::env::var("DOCCHAT_PROVIDER") {
            config.generation.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCCHAT_MODEL") {
            config.generation.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
            result.documents_dir = result.workspace.join("documents");
        }

        if let Some(documents) = config_file.documents {
            result.documents_dir = result.resolve_path(&documents);
        }

        if let Some(prompts) = config_file.prompts {
            result.prompts_dir = Some(result.resolve_path(&prompts));
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(transcription) = config_file.transcription {
            result.transcription = transcription;
        }
        if config_file.synthesis.is_some() {
            result.synthesis = config_file.synthesis;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        documents: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(documents) = documents {
            self.documents_dir = documents;
        }

        if let Some(provider) = provider {
            self.generation.provider = provider;
        }

        if let Some(model) = model {
            self.generation.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docchat directory.
    pub fn config_dir(&self) -> PathBuf {
        self.workspace.join(".docchat")
    }

    /// Resolve a possibly-relative path against the workspace.
    fn resolve_path(&self, value: &str) -> PathBuf {
        let path = PathBuf::from(value);
        if path.is_absolute() {
            path
        } else {
            self.workspace.join(path)
        }
    }

    /// Read an API key from the named environment variable.
    ///
    /// Returns `None` when no variable is configured; an error when the
    /// variable is configured but unset or empty.
    pub fn resolve_api_key(env_var: Option<&str>) -> AppResult<Option<String>> {
        let Some(env_var) = env_var else {
            return Ok(None);
        };

        match std::env::var(env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(key)),
            _ => Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            ))),
        }
    }

    /// Validate configuration before any service is constructed.
    ///
    /// Missing credentials are fatal: the process must refuse to start.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.generation.provider.to_lowercase();
        if !KNOWN_GENERATION_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                self.generation.provider,
                KNOWN_GENERATION_PROVIDERS.join(", ")
            )));
        }

        if provider != "ollama" {
            if self.generation.api_key_env.is_none() {
                return Err(AppError::Config(format!(
                    "Provider '{}' requires apiKeyEnv to be configured",
                    self.generation.provider
                )));
            }
            Self::resolve_api_key(self.generation.api_key_env.as_deref())?;
        }

        let embedding = self.embedding.provider.to_lowercase();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        Self::resolve_api_key(self.transcription.api_key_env.as_deref())?;

        if let Some(ref synthesis) = self.synthesis {
            Self::resolve_api_key(synthesis.api_key_env.as_deref())?;
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("retrieval.topK must be at least 1".to_string()));
        }

        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(AppError::Config(format!(
                "retrieval.chunkOverlap ({}) must be smaller than retrieval.chunkSize ({})",
                self.retrieval.chunk_overlap, self.retrieval.chunk_size
            )));
        }

        Ok(())
    }
}

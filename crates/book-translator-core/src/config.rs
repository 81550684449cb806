use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Language codes following ISO 639-1 with regional variants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Default source language code
pub const DEFAULT_SOURCE_LANG: &str = "en";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "tr";
/// Provider input limit, in characters
pub const DEFAULT_CHUNK_SIZE: usize = 4000;
/// Pause after every provider call
pub const DEFAULT_PACING_MS: u64 = 200;

fn default_source_lang() -> Lang {
    Lang::new(DEFAULT_SOURCE_LANG)
}

fn default_target_lang() -> Lang {
    Lang::new(DEFAULT_TARGET_LANG)
}

/// Which translation backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Public Google Translate web endpoint
    #[default]
    Google,
    /// Any OpenAI-compatible chat completions API
    OpenAi,
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAi),
            other => Err(Error::ConfigInvalid {
                field: "translator.provider".to_string(),
                reason: format!("unknown provider '{other}' (expected google or openai)"),
            }),
        }
    }
}

/// Translator backend configuration.
///
/// The OpenAI fields work with llama.cpp, Ollama, DeepSeek, OpenAI and any other
/// OpenAI-compatible API. Google needs none of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_model() -> String {
    "default_model".to_string()
}

const fn default_retry_count() -> u32 {
    1
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Chunking and pacing of provider calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Maximum characters per provider call
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Delay after each provider call in milliseconds
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// In-memory chunk cache capacity (0 = disabled)
    #[serde(default = "default_cache_entries")]
    pub cache_entries: u64,
}

const fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

const fn default_pacing_ms() -> u64 {
    DEFAULT_PACING_MS
}

const fn default_cache_entries() -> u64 {
    1000
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            pacing_ms: default_pacing_ms(),
            cache_entries: default_cache_entries(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Embedded sled database on disk
    #[default]
    Sled,
    /// Process memory, lost on restart
    Memory,
}

/// Book store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database directory (defaults to $XDG_DATA_HOME/book-translator/db)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    /// Files on local disk, served by the web server under /files
    #[default]
    Local,
    /// Supabase Storage bucket
    Supabase,
}

/// Storage for the original PDF files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(default)]
    pub backend: BlobBackend,

    /// Directory for the local backend (defaults to $XDG_DATA_HOME/book-translator/pdfs)
    pub dir: Option<PathBuf>,

    /// Base URL prepended to /files/<name> for the local backend
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,

    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_public_base_url() -> String {
    String::new()
}

fn default_bucket() -> String {
    "pdfs".to_string()
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackend::default(),
            dir: None,
            public_base_url: default_public_base_url(),
            supabase_url: None,
            supabase_key: None,
            bucket: default_bucket(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upload size limit in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// How often the progress stream re-reads job status
    #[serde(default = "default_status_poll_ms")]
    pub status_poll_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_upload_mb() -> usize {
    100
}

const fn default_status_poll_ms() -> u64 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
            status_poll_ms: default_status_poll_ms(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source language
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    /// Target language
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Translator backend configuration
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Chunking and pacing
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Book store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Original PDF storage
    #[serde(default)]
    pub blob: BlobConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            translator: TranslatorConfig::default(),
            translation: TranslationConfig::default(),
            storage: StorageConfig::default(),
            blob: BlobConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load from default locations (~/.config/book-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("book-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.translation.chunk_size == 0 {
            return Err(Error::ConfigInvalid {
                field: "translation.chunk_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.translator.provider == ProviderKind::OpenAi && self.translator.retry_count == 0 {
            return Err(Error::ConfigInvalid {
                field: "translator.retry_count".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        if self.blob.backend == BlobBackend::Supabase {
            for (field, value) in [
                ("blob.supabase_url", &self.blob.supabase_url),
                ("blob.supabase_key", &self.blob.supabase_key),
            ] {
                if value.as_deref().is_none_or(str::is_empty) {
                    return Err(Error::ConfigInvalid {
                        field: field.to_string(),
                        reason: "required for the supabase blob backend".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Resolved sled directory
    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| crate::util::data_path("db"))
    }

    /// Resolved directory for locally stored PDFs
    pub fn blob_dir(&self) -> PathBuf {
        self.blob
            .dir
            .clone()
            .unwrap_or_else(|| crate::util::data_path("pdfs"))
    }
}

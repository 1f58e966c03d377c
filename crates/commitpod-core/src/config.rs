//! Configuration management for commitpod
//!
//! Supports feature-specific configuration sections:
//! - [generate] - token limits, prompt language and style, fan-out width
//! - [api] - OpenAI-compatible endpoint settings
//! - [diff] - which staged files are left out of the diff

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: &str = "1";

/// Supported configuration versions
pub const SUPPORTED_CONFIG_VERSIONS: &[&str] = &["1"];

/// Repo-local configuration file name
pub const REPO_CONFIG_FILE: &str = ".commitpod.toml";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for tracking schema changes
    #[serde(default = "default_config_version")]
    pub version: String,

    #[serde(default)]
    pub generate: Option<GenerateConfig>,

    #[serde(default)]
    pub api: Option<ApiConfig>,

    #[serde(default)]
    pub diff: Option<DiffConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            generate: None,
            api: None,
            diff: None,
        }
    }
}

/// Token limits and prompt options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateConfig {
    /// Context size of the model, in tokens
    #[serde(default = "default_max_tokens_input")]
    pub max_tokens_input: usize,

    /// Tokens reserved for each reply
    #[serde(default = "default_max_tokens_output")]
    pub max_tokens_output: usize,

    /// Language code for the commit message
    #[serde(default = "default_language")]
    pub language: String,

    /// Prefix messages with a GitMoji
    #[serde(default)]
    pub emoji: bool,

    /// Add a short description paragraph after the subject
    #[serde(default)]
    pub description: bool,

    /// Maximum backend calls in flight for a split diff
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Characters per token for the approximate tokenizer
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            max_tokens_input: default_max_tokens_input(),
            max_tokens_output: default_max_tokens_output(),
            language: default_language(),
            emoji: false,
            description: false,
            concurrency: default_concurrency(),
            chars_per_token: default_chars_per_token(),
        }
    }
}

/// OpenAI-compatible endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key; prefer `api_key_env` so keys stay out of files
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable read when `api_key` is unset
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// The configured key, falling back to `api_key_env`
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.is_empty())
    }
}

/// Staged file selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DiffConfig {
    /// Extra regex patterns for paths to leave out
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Keep lock files and images that are excluded by default
    #[serde(default)]
    pub include_lock_files: bool,
}

// Default value functions for root Config
fn default_config_version() -> String {
    CURRENT_CONFIG_VERSION.to_string()
}

// Default value functions for Generate
fn default_max_tokens_input() -> usize {
    4096
}

fn default_max_tokens_output() -> usize {
    500
}

fn default_language() -> String {
    "en".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_chars_per_token() -> usize {
    4
}

// Default value functions for Api
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Check if the configuration version is supported
    pub fn is_version_supported(&self) -> bool {
        SUPPORTED_CONFIG_VERSIONS.contains(&self.version.as_str())
    }

    /// Get a warning message for unsupported versions
    pub fn version_warning(&self) -> Option<String> {
        if !self.is_version_supported() {
            Some(format!(
                "Configuration version '{}' is not supported. Supported versions: {}. Using defaults where needed.",
                self.version,
                SUPPORTED_CONFIG_VERSIONS.join(", ")
            ))
        } else {
            None
        }
    }

    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content).map_err(|source| CoreError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        if let Some(warning) = config.version_warning() {
            warn!("{}", warning);
        }

        // Set to current version if empty or missing
        if config.version.is_empty() {
            config.version = CURRENT_CONFIG_VERSION.to_string();
        }

        Ok(config)
    }

    /// Load configuration with priority:
    /// 1. Defaults
    /// 2. Global config (<config home>/config.toml)
    /// 3. Repo config (.commitpod.toml)
    ///
    /// Files that are missing are skipped; files that fail to parse are
    /// skipped with a warning.
    pub fn load() -> Self {
        let mut config = Self::default();

        let global_config = crate::get_config_home().map(|dir| dir.join("config.toml"));
        let repo_config = Some(PathBuf::from(REPO_CONFIG_FILE));

        for path in [global_config, repo_config].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(loaded) => {
                    debug!(path = %path.display(), "loaded config");
                    config = config.merge(loaded);
                }
                Err(e) => warn!("Skipping config: {}", e),
            }
        }

        config
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(mut self, other: Config) -> Self {
        if !other.version.is_empty() {
            self.version = other.version;
        }

        if other.generate.is_some() {
            self.generate = other.generate;
        }
        if other.api.is_some() {
            self.api = other.api;
        }
        if other.diff.is_some() {
            self.diff = other.diff;
        }
        self
    }

    pub fn generate(&self) -> GenerateConfig {
        self.generate.clone().unwrap_or_default()
    }

    pub fn api(&self) -> ApiConfig {
        self.api.clone().unwrap_or_default()
    }

    pub fn diff(&self) -> DiffConfig {
        self.diff.clone().unwrap_or_default()
    }
}

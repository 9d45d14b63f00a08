//! Configuration management
//!
//! This module handles loading, validation, and management of the Docket configuration.
//! Configuration is stored in TOML format at ~/.docket/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **llm**: Text-generation provider settings and sampling parameters
//! - **dispatch**: Per-capability timeout
//! - **classifier**: Behaviour when no task category matches
//!
//! # Environment Overrides
//!
//! After the file is parsed, a small set of environment variables take
//! precedence over the file: `DEFAULT_LLM_PROVIDER`, `DEFAULT_MODEL` (applied to
//! the selected provider), `TEMPERATURE` and `MAX_TOKENS`. API keys are never
//! stored in the config file; see [`crate::secrets`].
//!
//! # Examples
//!
//! ```no_run
//! use docket_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! // Access configuration values
//! println!("Default provider: {}", config.llm.default_provider);
//! println!("Timeout: {:?}", config.dispatch.capability_timeout());
//! # Ok(())
//! # }
//! ```

use crate::orchestrator::classifier::FallbackPolicy;
use crate::orchestrator::dispatcher::DEFAULT_CAPABILITY_TIMEOUT;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Dispatcher settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Text-generation providers known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(EngineError::UnknownProvider(other.to_string())),
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Default LLM provider (openai, anthropic, ollama)
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,

    /// Sampling temperature (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// OpenAI provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,

    /// Anthropic provider settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,
    // Note: API key read from OPENAI_API_KEY, not from config
}

/// Anthropic provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL for Anthropic API
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,
    // Note: API key read from ANTHROPIC_API_KEY, not from config
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Timeout applied to each capability independently (seconds)
    #[serde(default = "default_capability_timeout_secs")]
    pub capability_timeout_secs: u64,
}

impl DispatchConfig {
    pub fn capability_timeout(&self) -> Duration {
        Duration::from_secs(self.capability_timeout_secs)
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// What to return when no category matches
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenAI
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_capability_timeout_secs() -> u64 {
    DEFAULT_CAPABILITY_TIMEOUT.as_secs()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            openai: OpenAIConfig::default(),
            anthropic: AnthropicConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            model: default_anthropic_model(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            capability_timeout_secs: default_capability_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LLMConfig::default(),
            dispatch: DispatchConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl LLMConfig {
    /// Model name of the selected provider
    pub fn selected_model(&self) -> &str {
        match self.default_provider {
            ProviderKind::OpenAI => &self.openai.model,
            ProviderKind::Anthropic => &self.anthropic.model,
            ProviderKind::Ollama => &self.ollama.model,
        }
    }

    fn selected_model_mut(&mut self) -> &mut String {
        match self.default_provider {
            ProviderKind::OpenAI => &mut self.openai.model,
            ProviderKind::Anthropic => &mut self.anthropic.model,
            ProviderKind::Ollama => &mut self.ollama.model,
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.docket/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    /// Environment overrides are applied and the result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - An environment override is malformed
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml_str(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let defaults = Self::default();

        // Serialize to TOML
        let toml_string = toml::to_string_pretty(&defaults)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        // Write to file
        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        // The file holds the plain defaults; overrides only live in memory
        let mut config = defaults;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.docket/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".docket").join("config.toml"))
    }

    /// Apply environment-style overrides from a lookup function
    ///
    /// The provider override is applied first so that `DEFAULT_MODEL` lands on
    /// the provider that will actually be used.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = lookup("DEFAULT_LLM_PROVIDER") {
            self.llm.default_provider = provider.parse()?;
        }

        if let Some(model) = lookup("DEFAULT_MODEL") {
            *self.llm.selected_model_mut() = model.trim().to_string();
        }

        if let Some(temperature) = lookup("TEMPERATURE") {
            self.llm.temperature = temperature.trim().parse().map_err(|_| {
                EngineError::Config(format!("TEMPERATURE is not a number: '{}'", temperature))
            })?;
        }

        if let Some(max_tokens) = lookup("MAX_TOKENS") {
            self.llm.max_tokens = max_tokens.trim().parse().map_err(|_| {
                EngineError::Config(format!(
                    "MAX_TOKENS is not a positive integer: '{}'",
                    max_tokens
                ))
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), EngineError> {
        // Validate log level
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        // Validate sampling parameters
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(EngineError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.selected_model().trim().is_empty() {
            return Err(EngineError::Config(format!(
                "No model configured for provider '{}'",
                self.llm.default_provider
            )));
        }

        // Validate timeout
        if self.dispatch.capability_timeout_secs == 0 {
            return Err(EngineError::Config(
                "capability_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

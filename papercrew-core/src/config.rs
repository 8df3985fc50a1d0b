//! Configuration types for papercrew
//!
//! Configuration is layered with figment:
//!
//! 1. Built-in defaults
//! 2. `papercrew.toml` in the working directory (if present)
//! 3. An explicit file (`--config` or `PAPERCREW_CONFIG`)
//! 4. `PAPERCREW_` prefixed environment variables, nested keys split on `__`
//!    (e.g. `PAPERCREW_SERVER__PORT=8080`)
//! 5. Credentials from `OPENROUTER_API_KEY` / `SERPER_API_KEY` when no
//!    earlier layer set them
//!
//! Credentials are not validated here. A missing key surfaces as a
//! configuration error on the first model or search call.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CompanionError, Result};

/// Environment variable holding the language-model credential
pub const OPENROUTER_API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Environment variable holding the search credential
pub const SERPER_API_KEY_VAR: &str = "SERPER_API_KEY";

/// Environment variable pointing at an extra configuration file
pub const CONFIG_PATH_VAR: &str = "PAPERCREW_CONFIG";

/// Default OpenRouter API base
pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model served through OpenRouter
pub const DEFAULT_LLM_MODEL: &str = "qwen/qwen3-235b-a22b-2507:free";

/// Default Serper search endpoint
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://google.serper.dev/search";

/// Main configuration for papercrew
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompanionConfig {
    /// Language-model settings
    pub llm: LlmSettings,

    /// Web search settings
    pub search: SearchSettings,

    /// Agent loop settings
    pub agent: AgentSettings,

    /// Web form server settings
    pub server: ServerSettings,
}

/// Language-model settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model identifier as understood by the API
    pub model: String,

    /// API base URL (OpenAI-compatible)
    pub base_url: String,

    /// API key (prefer the `OPENROUTER_API_KEY` env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_LLM_MODEL.to_string(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Web search settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Enable the web search capability
    pub enabled: bool,

    /// Search endpoint
    pub endpoint: String,

    /// Number of results requested per query
    pub num_results: usize,

    /// API key (prefer the `SERPER_API_KEY` env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            num_results: 5,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for SearchSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSettings")
            .field("enabled", &self.enabled)
            .field("endpoint", &self.endpoint)
            .field("num_results", &self.num_results)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Agent loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum model calls per task before a final answer is forced
    pub max_iterations: usize,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    /// Maximum tokens per model call
    pub max_tokens: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

/// Web form server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

impl CompanionConfig {
    /// Load configuration from defaults, files and environment variables.
    ///
    /// `path` takes precedence over `PAPERCREW_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named configuration file is missing
    /// or any configuration file is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(CompanionConfig::default()))
            .merge(Toml::file("papercrew.toml"));

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from));
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CompanionError::Configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        let mut config: CompanionConfig = figment
            .merge(Env::prefixed("PAPERCREW_").split("__"))
            .extract()
            .map_err(|e| {
                CompanionError::Configuration(format!("Failed to load configuration: {}", e))
            })?;

        config.apply_credentials(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Serialized, Toml},
        };

        let path = path.as_ref();
        if !path.exists() {
            return Err(CompanionError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let config: CompanionConfig = Figment::from(Serialized::defaults(CompanionConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                CompanionError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Fill unset credentials using `lookup` (normally the process environment).
    pub fn apply_credentials(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |v: String| {
            let v = v.trim().to_string();
            (!v.is_empty()).then_some(v)
        };

        if self.llm.api_key.is_none() {
            self.llm.api_key = lookup(OPENROUTER_API_KEY_VAR).and_then(non_empty);
        }
        if self.search.api_key.is_none() {
            self.search.api_key = lookup(SERPER_API_KEY_VAR).and_then(non_empty);
        }
    }

    /// Names of the credential variables that are still unset.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.llm.api_key.is_none() {
            missing.push(OPENROUTER_API_KEY_VAR);
        }
        if self.search.enabled && self.search.api_key.is_none() {
            missing.push(SERPER_API_KEY_VAR);
        }
        missing
    }

    fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(CompanionError::Configuration(
                "llm.model must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(CompanionError::Configuration(format!(
                "agent.temperature must be within 0.0-2.0, got {}",
                self.agent.temperature
            )));
        }
        if self.agent.max_iterations == 0 {
            return Err(CompanionError::Configuration(
                "agent.max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

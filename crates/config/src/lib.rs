//! Configuration loading and validation for memoraid.
//!
//! Configuration is an already-loaded key/value view over a TOML file plus
//! environment-variable overrides. It carries the deployment region, the
//! explicit provider choices per role, per-vendor credentials, and the
//! resilience knobs (timeout, retry budget, backoff base).

use memoraid_core::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Deployment region; selects a disjoint vendor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Domestic,
    #[default]
    International,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment region (disjoint vendor sets).
    #[serde(default)]
    pub region: Region,

    /// Output language tag ("zh-CN", "en-US", ...). Defaults per region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Explicit provider name for structured-aid generation. Falls back to
    /// the per-region default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Explicit provider name for the speech role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_provider: Option<String>,

    /// When set, the deterministic mock provider is used for every role
    /// regardless of region. For offline development and tests.
    #[serde(default)]
    pub mock_mode: bool,

    /// Per-attempt upstream timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempt budget for structured-aid generation.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff between attempts.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Per-vendor settings, keyed by provider name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_timeout_secs() -> u64 {
    90
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    500
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            language: None,
            provider: None,
            speech_provider: None,
            mock_mode: false,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            providers: HashMap::new(),
        }
    }
}

/// Per-vendor configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("region", &self.region)
            .field("language", &self.language)
            .field("provider", &self.provider)
            .field("speech_provider", &self.speech_provider)
            .field("mock_mode", &self.mock_mode)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Vendor names that require a credential, per region.
const DOMESTIC_REQUIRED: &[&str] = &["qwen"];
const INTERNATIONAL_REQUIRED: &[&str] = &["gemini"];

impl AppConfig {
    /// Load configuration from the environment only.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides(|var| std::env::var(var).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment
    /// overrides on top.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_from_with_env(path, |var| std::env::var(var).ok())
    }

    // The env lookup is injected so loading stays deterministic under test.
    fn load_from_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&raw)?;
        config.apply_env_overrides(env);
        config.validate()?;
        debug!(path = %path.display(), region = ?config.region, "Loaded configuration");
        Ok(config)
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(region) = env("MEMORAID_REGION") {
            match region.to_ascii_lowercase().as_str() {
                "domestic" | "china" => self.region = Region::Domestic,
                "international" | "global" => self.region = Region::International,
                _ => {}
            }
        }
        if let Some(language) = env("MEMORAID_LANGUAGE") {
            self.language = Some(language);
        }
        if let Some(provider) = env("MEMORAID_PROVIDER") {
            self.provider = Some(provider);
        }
        if let Some(provider) = env("MEMORAID_SPEECH_PROVIDER") {
            self.speech_provider = Some(provider);
        }
        if let Some(mock) = env("MEMORAID_MOCK") {
            self.mock_mode = matches!(mock.as_str(), "1" | "true" | "yes");
        }
        if let Some(timeout) = env("MEMORAID_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse()
        {
            self.timeout_secs = secs;
        }
        if let Some(retries) = env("MEMORAID_MAX_RETRIES")
            && let Ok(count) = retries.parse()
        {
            self.max_retries = count;
        }

        // Per-vendor credentials follow the conventional env var names.
        for (vendor, var) in [
            ("gemini", "GEMINI_API_KEY"),
            ("openai", "OPENAI_API_KEY"),
            ("claude", "CLAUDE_API_KEY"),
            ("qwen", "QWEN_API_KEY"),
            ("zhipu", "ZHIPU_API_KEY"),
        ] {
            if let Some(key) = env(var) {
                self.providers.entry(vendor.into()).or_default().api_key = Some(key);
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid {
                message: "max_retries must be at least 1".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "timeout_secs must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// The active output language, defaulted per region.
    pub fn language(&self) -> Language {
        match &self.language {
            Some(tag) => Language::from_tag(tag),
            None => match self.region {
                Region::Domestic => Language::Chinese,
                Region::International => Language::English,
            },
        }
    }

    /// Vendor settings for `name`, if any were configured.
    pub fn provider_config(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// The configured credential for `name`, if present and non-empty.
    pub fn credential(&self, name: &str) -> Option<&str> {
        self.providers
            .get(name)
            .and_then(|p| p.api_key.as_deref())
            .filter(|k| !k.is_empty())
    }

    /// Required credentials missing for the active region. Advisory: used
    /// for deployment diagnostics, not control flow.
    pub fn missing_credentials(&self) -> Vec<String> {
        if self.mock_mode {
            return Vec::new();
        }
        let required = match self.region {
            Region::Domestic => DOMESTIC_REQUIRED,
            Region::International => INTERNATIONAL_REQUIRED,
        };
        required
            .iter()
            .filter(|vendor| self.credential(vendor).is_none())
            .map(|vendor| format!("{vendor} (no API key configured)"))
            .collect()
    }
}

//! International vendor variants: Gemini, OpenAI, Claude.
//!
//! Each variant only shapes the request body, sets the vendor's auth
//! header, and extracts the reply text. Interpretation of that text is the
//! repair pipeline's job.

use crate::{check_status, prompt, transport_error};
use async_trait::async_trait;
use memoraid_config::AppConfig;
use memoraid_core::{AidProvider, Error, Language, ProviderError};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

fn build_client(timeout_secs: u64) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Config {
            message: format!("Failed to build HTTP client: {e}"),
        })
}

fn require_credential(config: &AppConfig, vendor: &str, env_var: &str) -> Result<String, Error> {
    config
        .credential(vendor)
        .map(str::to_string)
        .ok_or_else(|| Error::Config {
            message: format!("{vendor} API key is not configured ({env_var})"),
        })
}

/// Google Gemini (generativelanguage API shape).
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    language: Language,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let api_key = require_credential(config, "gemini", "GEMINI_API_KEY")?;
        let vendor = config.provider_config("gemini");
        Ok(Self {
            api_key,
            base_url: vendor
                .and_then(|v| v.base_url.clone())
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".into())
                .trim_end_matches('/')
                .to_string(),
            model: vendor
                .and_then(|v| v.model.clone())
                .unwrap_or_else(|| "gemini-2.5-flash".into()),
            language: config.language(),
            timeout_secs: config.timeout_secs,
            client: build_client(config.timeout_secs)?,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        debug!(model = %self.model, "Sending Gemini generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        let response = check_status(response).await?;

        let reply: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(reply
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[async_trait]
impl AidProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_structured_aid(&self, content: &str) -> Result<String, ProviderError> {
        self.complete(&prompt::aid_prompt(content, self.language))
            .await?
            .ok_or(ProviderError::EmptyResponse)
    }

    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        self.complete(prompt).await
    }
}

/// OpenAI chat-completions shape.
pub struct OpenAiProvider {
    api_key: String,
    base_url: String,
    model: String,
    language: Language,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let api_key = require_credential(config, "openai", "OPENAI_API_KEY")?;
        let vendor = config.provider_config("openai");
        Ok(Self {
            api_key,
            base_url: vendor
                .and_then(|v| v.base_url.clone())
                .unwrap_or_else(|| "https://api.openai.com/v1".into())
                .trim_end_matches('/')
                .to_string(),
            model: vendor
                .and_then(|v| v.model.clone())
                .unwrap_or_else(|| "gpt-4o".into()),
            language: config.language(),
            timeout_secs: config.timeout_secs,
            client: build_client(config.timeout_secs)?,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
            "max_tokens": 2000,
        });

        debug!(model = %self.model, "Sending OpenAI completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        let response = check_status(response).await?;

        let reply: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[async_trait]
impl AidProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_structured_aid(&self, content: &str) -> Result<String, ProviderError> {
        self.complete(&prompt::aid_prompt(content, self.language))
            .await?
            .ok_or(ProviderError::EmptyResponse)
    }

    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        self.complete(prompt).await
    }
}

/// Anthropic Claude messages shape.
pub struct ClaudeProvider {
    api_key: String,
    base_url: String,
    model: String,
    language: Language,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl ClaudeProvider {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let api_key = require_credential(config, "claude", "CLAUDE_API_KEY")?;
        let vendor = config.provider_config("claude");
        Ok(Self {
            api_key,
            base_url: vendor
                .and_then(|v| v.base_url.clone())
                .unwrap_or_else(|| "https://api.anthropic.com".into())
                .trim_end_matches('/')
                .to_string(),
            model: vendor
                .and_then(|v| v.model.clone())
                .unwrap_or_else(|| "claude-3-sonnet-20240229".into()),
            language: config.language(),
            timeout_secs: config.timeout_secs,
            client: build_client(config.timeout_secs)?,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = json!({
            "model": self.model,
            "max_tokens": 2000,
            "temperature": 0.7,
            "messages": [{ "role": "user", "content": prompt }],
        });

        debug!(model = %self.model, "Sending Claude messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs))?;
        let response = check_status(response).await?;

        let reply: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(reply
            .pointer("/content/0/text")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[async_trait]
impl AidProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    async fn generate_structured_aid(&self, content: &str) -> Result<String, ProviderError> {
        self.complete(&prompt::aid_prompt(content, self.language))
            .await?
            .ok_or(ProviderError::EmptyResponse)
    }

    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        self.complete(prompt).await
    }
}

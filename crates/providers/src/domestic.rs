//! Domestic vendor variants: Qwen (DashScope) and Zhipu (GLM).
//!
//! Same scope as the international variants: request shaping, auth header,
//! reply-text extraction. Nothing here parses the reply.

use crate::{check_status, prompt, transport_error};
use async_trait::async_trait;
use memoraid_config::AppConfig;
use memoraid_core::{AidProvider, Error, Language, ProviderError};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Alibaba Tongyi Qianwen via the DashScope text-generation API.
pub struct QwenProvider {
    api_key: String,
    base_url: String,
    model: String,
    language: Language,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl QwenProvider {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let api_key = config
            .credential("qwen")
            .map(str::to_string)
            .ok_or_else(|| Error::Config {
                message: "qwen API key is not configured (QWEN_API_KEY)".into(),
            })?;
        let vendor = config.provider_config("qwen");
        let timeout_secs = config.timeout_secs;
        Ok(Self {
            api_key,
            base_url: vendor
                .and_then(|v| v.base_url.clone())
                .unwrap_or_else(|| "https://dashscope.aliyuncs.com/api/v1".into())
                .trim_end_matches('/')
                .to_string(),
            model: vendor
                .and_then(|v| v.model.clone())
                .unwrap_or_else(|| "qwen-turbo".into()),
            language: config.language(),
            timeout_secs,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .map_err(|e| Error::Config {
                    message: format!("Failed to build HTTP client: {e}"),
                })?,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let url = format!(
            "{}/services/aigc/text-generation/generation",
            self.base_url
        );
        let body = json!({
            "model": self.model,
            "input": { "messages": [{ "role": "user", "content": prompt }] },
            "parameters": { "temperature": 0.7, "max_tokens": 2000 },
        });

        debug!(model = %self.model, "Sending Qwen generation request");

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
            .pointer("/output/text")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

#[async_trait]
impl AidProvider for QwenProvider {
    fn name(&self) -> &str {
        "qwen"
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

/// Zhipu GLM via the open.bigmodel chat-completions API.
pub struct ZhipuProvider {
    api_key: String,
    base_url: String,
    model: String,
    language: Language,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl ZhipuProvider {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let api_key = config
            .credential("zhipu")
            .map(str::to_string)
            .ok_or_else(|| Error::Config {
                message: "zhipu API key is not configured (ZHIPU_API_KEY)".into(),
            })?;
        let vendor = config.provider_config("zhipu");
        let timeout_secs = config.timeout_secs;
        Ok(Self {
            api_key,
            base_url: vendor
                .and_then(|v| v.base_url.clone())
                .unwrap_or_else(|| "https://open.bigmodel.cn".into())
                .trim_end_matches('/')
                .to_string(),
            model: vendor
                .and_then(|v| v.model.clone())
                .unwrap_or_else(|| "glm-4".into()),
            language: config.language(),
            timeout_secs,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .map_err(|e| Error::Config {
                    message: format!("Failed to build HTTP client: {e}"),
                })?,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/api/paas/v4/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
            "max_tokens": 2000,
        });

        debug!(model = %self.model, "Sending Zhipu completion request");

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
impl AidProvider for ZhipuProvider {
    fn name(&self) -> &str {
        "zhipu"
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

#[cfg(test)]
mod tests {
    use super::*;
    use memoraid_config::ProviderConfig;

    #[test]
    fn qwen_requires_credential_at_construction() {
        let err = QwenProvider::new(&AppConfig::default()).err().unwrap();
        assert!(err.to_string().contains("QWEN_API_KEY"));
    }

    #[test]
    fn zhipu_constructs_with_defaults() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "zhipu".into(),
            ProviderConfig {
                api_key: Some("k".into()),
                ..Default::default()
            },
        );
        let provider = ZhipuProvider::new(&config).unwrap();
        assert_eq!(provider.name(), "zhipu");
        assert_eq!(provider.model, "glm-4");
        assert!(provider.base_url.contains("bigmodel"));
    }
}

//! Provider registry — resolves and caches the concrete provider per role.
//!
//! Selection policy: mock flag wins outright, then the deployment region
//! picks a disjoint vendor set, then the explicit provider name (with a
//! per-region default) picks the vendor. Construction validates credentials
//! so a misconfigured deployment fails on startup, not on the first user
//! request. One instance per role is built lazily and cached for the
//! process lifetime; construction is race-safe.

use crate::domestic::{QwenProvider, ZhipuProvider};
use crate::international::{ClaudeProvider, GeminiProvider, OpenAiProvider};
use crate::mock::MockProvider;
use memoraid_config::{AppConfig, Region};
use memoraid_core::{AidProvider, Error, ProviderRole, Result};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

const DEFAULT_INTERNATIONAL: &str = "gemini";
const DEFAULT_DOMESTIC: &str = "qwen";

pub struct ProviderRegistry {
    config: AppConfig,
    aid: OnceCell<Arc<dyn AidProvider>>,
    speech: OnceCell<Arc<dyn AidProvider>>,
}

impl ProviderRegistry {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            aid: OnceCell::new(),
            speech: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Pre-register a provider for `role`, bypassing selection. Used to
    /// plug in stubs and embedded providers.
    pub fn with_provider(mut self, role: ProviderRole, provider: Arc<dyn AidProvider>) -> Self {
        let cell = OnceCell::new_with(Some(provider));
        match role {
            ProviderRole::Aid => self.aid = cell,
            ProviderRole::Speech => self.speech = cell,
        }
        self
    }

    /// The provider name that would be selected for `role`.
    pub fn provider_name(&self, role: ProviderRole) -> String {
        if self.config.mock_mode {
            return "mock".into();
        }
        let explicit = match role {
            ProviderRole::Aid => self.config.provider.as_deref(),
            ProviderRole::Speech => self
                .config
                .speech_provider
                .as_deref()
                .or(self.config.provider.as_deref()),
        };
        explicit
            .unwrap_or(match self.config.region {
                Region::Domestic => DEFAULT_DOMESTIC,
                Region::International => DEFAULT_INTERNATIONAL,
            })
            .to_string()
    }

    /// Resolve the cached provider for `role`, building it on first use.
    ///
    /// A race on first use constructs at most one instance; losers share
    /// the winner's. Construction failures are not cached, so a fixed
    /// deployment can recover on the next call.
    pub async fn resolve(&self, role: ProviderRole) -> Result<Arc<dyn AidProvider>> {
        let cell = match role {
            ProviderRole::Aid => &self.aid,
            ProviderRole::Speech => &self.speech,
        };
        cell.get_or_try_init(|| async { self.build(role) })
            .await
            .cloned()
    }

    fn build(&self, role: ProviderRole) -> Result<Arc<dyn AidProvider>> {
        if self.config.mock_mode {
            info!(%role, "Using mock provider (mock mode)");
            return Ok(Arc::new(MockProvider::new()));
        }

        let name = self.provider_name(role);
        let provider: Arc<dyn AidProvider> = match (self.config.region, name.as_str()) {
            (Region::International, "gemini") => Arc::new(GeminiProvider::new(&self.config)?),
            (Region::International, "openai") => Arc::new(OpenAiProvider::new(&self.config)?),
            (Region::International, "claude") => Arc::new(ClaudeProvider::new(&self.config)?),
            (Region::Domestic, "qwen") => Arc::new(QwenProvider::new(&self.config)?),
            (Region::Domestic, "zhipu") => Arc::new(ZhipuProvider::new(&self.config)?),
            (region, other) => {
                return Err(Error::Config {
                    message: format!("Unsupported provider '{other}' for region {region:?}"),
                });
            }
        };

        info!(%role, provider = %provider.name(), "Constructed provider");
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memoraid_config::ProviderConfig;

    fn mock_config() -> AppConfig {
        AppConfig {
            mock_mode: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn mock_flag_wins_regardless_of_region_and_name() {
        let mut config = mock_config();
        config.region = Region::Domestic;
        config.provider = Some("qwen".into());

        let registry = ProviderRegistry::new(config);
        let provider = registry.resolve(ProviderRole::Aid).await.unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[tokio::test]
    async fn resolve_caches_one_instance_per_role() {
        let registry = ProviderRegistry::new(mock_config());
        let a = registry.resolve(ProviderRole::Aid).await.unwrap();
        let b = registry.resolve(ProviderRole::Aid).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn roles_get_distinct_instances() {
        let registry = ProviderRegistry::new(mock_config());
        let aid = registry.resolve(ProviderRole::Aid).await.unwrap();
        let speech = registry.resolve(ProviderRole::Speech).await.unwrap();
        assert!(!Arc::ptr_eq(&aid, &speech));
    }

    #[test]
    fn per_region_defaults() {
        let registry = ProviderRegistry::new(AppConfig::default());
        assert_eq!(registry.provider_name(ProviderRole::Aid), "gemini");

        let mut config = AppConfig::default();
        config.region = Region::Domestic;
        let registry = ProviderRegistry::new(config);
        assert_eq!(registry.provider_name(ProviderRole::Aid), "qwen");
    }

    #[test]
    fn speech_role_falls_back_to_aid_provider_name() {
        let mut config = AppConfig::default();
        config.provider = Some("claude".into());
        let registry = ProviderRegistry::new(config);
        assert_eq!(registry.provider_name(ProviderRole::Speech), "claude");

        let mut config = AppConfig::default();
        config.provider = Some("claude".into());
        config.speech_provider = Some("openai".into());
        let registry = ProviderRegistry::new(config);
        assert_eq!(registry.provider_name(ProviderRole::Speech), "openai");
    }

    #[tokio::test]
    async fn missing_credentials_fail_fast_with_config_error() {
        // International default (gemini) with no key configured.
        let registry = ProviderRegistry::new(AppConfig::default());
        let err = registry.resolve(ProviderRole::Aid).await.err().unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn unknown_provider_name_is_a_config_error() {
        let mut config = AppConfig::default();
        config.provider = Some("qwen".into()); // wrong region for qwen
        let registry = ProviderRegistry::new(config);
        let err = registry.resolve(ProviderRole::Aid).await.err().unwrap();
        assert!(err.to_string().contains("Unsupported provider"));
    }

    #[tokio::test]
    async fn configured_vendor_resolves_in_its_region() {
        let mut config = AppConfig::default();
        config.region = Region::Domestic;
        config.provider = Some("zhipu".into());
        config.providers.insert(
            "zhipu".into(),
            ProviderConfig {
                api_key: Some("sk-test".into()),
                ..Default::default()
            },
        );
        let registry = ProviderRegistry::new(config);
        let provider = registry.resolve(ProviderRole::Aid).await.unwrap();
        assert_eq!(provider.name(), "zhipu");
    }
}

//! The orchestration façade the rest of the system calls.
//!
//! Owns provider resolution, per-attempt timeouts, retry with exponential
//! backoff, metrics recording, and the hand-off to the repair pipeline.
//! Transport and timeout failures are retried; malformed-but-delivered
//! replies are not — the repair pipeline absorbs those, and reparsing the
//! same text cannot change the outcome.

use crate::repair;
use memoraid_config::AppConfig;
use memoraid_core::{AidProvider, Error, ProviderError, ProviderRole, Result, StructuredAid};
use memoraid_providers::ProviderRegistry;
use memoraid_telemetry::{MetricsLog, PerformanceStats, RequestMetric};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct AidOrchestrator {
    registry: ProviderRegistry,
    metrics: Arc<MetricsLog>,
}

impl AidOrchestrator {
    pub fn new(config: AppConfig) -> Self {
        Self::with_registry(ProviderRegistry::new(config))
    }

    pub fn with_registry(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            metrics: Arc::new(MetricsLog::new()),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &MetricsLog {
        &self.metrics
    }

    /// Aggregate request statistics on demand. Observational only.
    pub fn performance_stats(&self) -> PerformanceStats {
        self.metrics.stats()
    }

    /// Generate a structured memory aid for `content`.
    ///
    /// Empty or whitespace-only input is rejected before any provider
    /// interaction. Transport failures are retried up to the configured
    /// attempt budget with doubling backoff; exhaustion surfaces as
    /// [`Error::Generation`]. A delivered reply always yields a
    /// schema-valid aid — the repair pipeline falls back rather than fail.
    pub async fn generate_aid(&self, content: &str) -> Result<StructuredAid> {
        if content.trim().is_empty() {
            return Err(Error::Validation("content must not be empty".into()));
        }

        let provider = self.registry.resolve(ProviderRole::Aid).await?;
        let metric = RequestMetric::start(provider.name());

        match self.attempt_with_retries(provider.as_ref(), content).await {
            Ok(raw) => {
                let language = self.registry.config().language();
                let aid = repair::parse(&raw, content, language);
                self.metrics.record(metric.finish(true, None));
                Ok(aid)
            }
            Err(err) => {
                self.metrics.record(metric.finish(false, Some(err.to_string())));
                Err(err)
            }
        }
    }

    /// Best-effort auxiliary text generation (speech/image prompt drafts).
    ///
    /// Single attempt, no retry loop: callers treat the result as advisory,
    /// so upstream failure collapses to `Ok(None)`. Configuration failures
    /// still surface — they indicate a deployment defect.
    pub async fn generate_auxiliary_text(
        &self,
        prompt: &str,
        role: ProviderRole,
    ) -> Result<Option<String>> {
        if prompt.trim().is_empty() {
            return Err(Error::Validation("prompt must not be empty".into()));
        }

        let provider = self.registry.resolve(role).await?;
        let metric = RequestMetric::start(provider.name());
        let timeout = Duration::from_secs(self.registry.config().timeout_secs);

        match tokio::time::timeout(timeout, provider.generate_text(prompt)).await {
            Ok(Ok(text)) => {
                self.metrics.record(metric.finish(true, None));
                Ok(text)
            }
            Ok(Err(err)) => {
                warn!(provider = %provider.name(), error = %err, "Auxiliary generation failed");
                self.metrics.record(metric.finish(false, Some(err.to_string())));
                Ok(None)
            }
            Err(_) => {
                warn!(provider = %provider.name(), "Auxiliary generation timed out");
                let err = ProviderError::Timeout(timeout.as_secs());
                self.metrics.record(metric.finish(false, Some(err.to_string())));
                Ok(None)
            }
        }
    }

    async fn attempt_with_retries(
        &self,
        provider: &dyn AidProvider,
        content: &str,
    ) -> Result<String> {
        let config = self.registry.config();
        let max_attempts = config.max_retries;
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut last_error = ProviderError::EmptyResponse;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                // Exponent is capped so a huge retry budget cannot overflow
                // the shift.
                let exponent = u32::min(attempt - 2, 16);
                let delay = Duration::from_millis(
                    config.retry_base_delay_ms.saturating_mul(1u64 << exponent),
                );
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }

            match tokio::time::timeout(timeout, provider.generate_structured_aid(content)).await {
                Ok(Ok(raw)) => {
                    info!(provider = %provider.name(), attempt, "Provider reply received");
                    return Ok(raw);
                }
                Ok(Err(err)) => {
                    warn!(
                        provider = %provider.name(),
                        attempt,
                        max_attempts,
                        error = %err,
                        "Provider call failed"
                    );
                    if !err.is_retryable() {
                        return Err(Error::Generation {
                            attempts: attempt,
                            source: err,
                        });
                    }
                    last_error = err;
                }
                Err(_) => {
                    // The in-flight request is abandoned, not cancelled
                    // upstream; we just stop waiting for it.
                    warn!(
                        provider = %provider.name(),
                        attempt,
                        timeout_secs = config.timeout_secs,
                        "Provider call timed out"
                    );
                    last_error = ProviderError::Timeout(config.timeout_secs);
                }
            }
        }

        Err(Error::Generation {
            attempts: max_attempts,
            source: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails the first `fail_times` calls, then succeeds with `reply`.
    struct StubProvider {
        reply: String,
        fail_times: usize,
        calls: Mutex<usize>,
    }

    impl StubProvider {
        fn new(reply: &str, fail_times: usize) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.into(),
                fail_times,
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl AidProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate_structured_aid(&self, _content: &str) -> std::result::Result<String, ProviderError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls <= self.fail_times {
                Err(ProviderError::Network("connection reset".into()))
            } else {
                Ok(self.reply.clone())
            }
        }

        async fn generate_text(&self, _prompt: &str) -> std::result::Result<Option<String>, ProviderError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls <= self.fail_times {
                Err(ProviderError::Network("connection reset".into()))
            } else {
                Ok(Some(self.reply.clone()))
            }
        }
    }

    const VALID_REPLY: &str =
        r#"{"mindMap":{"id":"root","label":"Topic"},"mnemonics":[],"sensoryAssociations":[]}"#;

    fn orchestrator_with(stub: Arc<StubProvider>) -> AidOrchestrator {
        let registry = ProviderRegistry::new(AppConfig::default())
            .with_provider(ProviderRole::Aid, stub.clone())
            .with_provider(ProviderRole::Speech, stub);
        AidOrchestrator::with_registry(registry)
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_any_provider_call() {
        let stub = StubProvider::new(VALID_REPLY, 0);
        let orchestrator = orchestrator_with(stub.clone());

        for input in ["", "   ", "\n\t"] {
            let err = orchestrator.generate_aid(input).await.err().unwrap();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert_eq!(stub.calls(), 0);
        // Rejected input is not a request; nothing is recorded.
        assert!(orchestrator.metrics().is_empty());
    }

    #[tokio::test]
    async fn successful_reply_is_repaired_into_an_aid() {
        let stub = StubProvider::new(VALID_REPLY, 0);
        let orchestrator = orchestrator_with(stub.clone());

        let aid = orchestrator.generate_aid("some content").await.unwrap();
        assert_eq!(aid.mind_map.unwrap().label, "Topic");
        assert_eq!(stub.calls(), 1);

        let stats = orchestrator.performance_stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.successful_requests, 1);
        assert_eq!(stats.success_rate, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let stub = StubProvider::new(VALID_REPLY, 2);
        let orchestrator = orchestrator_with(stub.clone());

        let aid = orchestrator.generate_aid("content").await.unwrap();
        assert!(aid.mind_map.is_some());
        // Two failures plus the succeeding attempt.
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_generation_error() {
        let stub = StubProvider::new(VALID_REPLY, usize::MAX);
        let orchestrator = orchestrator_with(stub.clone());

        let err = orchestrator.generate_aid("content").await.err().unwrap();
        match err {
            Error::Generation { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("Expected Generation, got: {other:?}"),
        }
        // Exactly the configured attempt budget, no more.
        assert_eq!(stub.calls(), 3);

        let stats = orchestrator.performance_stats();
        assert_eq!(stats.failed_requests, 1);
        let last = orchestrator.metrics().snapshot().pop().unwrap();
        assert!(last.error.as_deref().unwrap().contains("3 attempts"));
    }

    #[tokio::test]
    async fn malformed_reply_is_not_retried() {
        let stub = StubProvider::new("utter garbage, not json", 0);
        let orchestrator = orchestrator_with(stub.clone());

        let aid = orchestrator.generate_aid("光合作用").await.unwrap();
        // One transport success; the repair fallback absorbed the garbage.
        assert_eq!(stub.calls(), 1);
        assert_eq!(
            aid,
            StructuredAid::fallback("光合作用", memoraid_core::Language::English)
        );
        assert_eq!(orchestrator.performance_stats().successful_requests, 1);
    }

    /// Always errors with a non-retryable failure.
    struct AuthFailProvider {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl AidProvider for AuthFailProvider {
        fn name(&self) -> &str {
            "auth-fail"
        }

        async fn generate_structured_aid(&self, _content: &str) -> std::result::Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            Err(ProviderError::AuthenticationFailed("bad key".into()))
        }

        async fn generate_text(&self, _prompt: &str) -> std::result::Result<Option<String>, ProviderError> {
            Err(ProviderError::AuthenticationFailed("bad key".into()))
        }
    }

    #[tokio::test]
    async fn deterministic_failures_are_not_retried() {
        let stub = Arc::new(AuthFailProvider {
            calls: Mutex::new(0),
        });
        let registry = ProviderRegistry::new(AppConfig::default())
            .with_provider(ProviderRole::Aid, stub.clone());
        let orchestrator = AidOrchestrator::with_registry(registry);

        let err = orchestrator.generate_aid("content").await.err().unwrap();
        assert!(matches!(err, Error::Generation { attempts: 1, .. }));
        assert_eq!(*stub.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn auxiliary_text_succeeds_without_retries() {
        let stub = StubProvider::new("a narration draft", 0);
        let orchestrator = orchestrator_with(stub.clone());

        let text = orchestrator
            .generate_auxiliary_text("describe this", ProviderRole::Speech)
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("a narration draft"));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn auxiliary_text_failure_collapses_to_none() {
        let stub = StubProvider::new("never reached", usize::MAX);
        let orchestrator = orchestrator_with(stub.clone());

        let text = orchestrator
            .generate_auxiliary_text("describe this", ProviderRole::Speech)
            .await
            .unwrap();
        assert!(text.is_none());
        // Best-effort means a single attempt.
        assert_eq!(stub.calls(), 1);
        assert_eq!(orchestrator.performance_stats().failed_requests, 1);
    }

    #[tokio::test]
    async fn empty_auxiliary_prompt_is_rejected() {
        let stub = StubProvider::new("x", 0);
        let orchestrator = orchestrator_with(stub.clone());
        let err = orchestrator
            .generate_auxiliary_text("  ", ProviderRole::Speech)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(stub.calls(), 0);
    }

    /// Never replies within any finite timeout.
    struct StalledProvider {
        calls: Mutex<usize>,
    }

    impl StalledProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl AidProvider for StalledProvider {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn generate_structured_aid(&self, _content: &str) -> std::result::Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(String::new())
        }

        async fn generate_text(&self, _prompt: &str) -> std::result::Result<Option<String>, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_attempts_are_retried_until_the_budget_is_spent() {
        let stub = StalledProvider::new();
        let registry = ProviderRegistry::new(AppConfig::default())
            .with_provider(ProviderRole::Aid, stub.clone());
        let orchestrator = AidOrchestrator::with_registry(registry);

        let err = orchestrator.generate_aid("content").await.err().unwrap();
        match err {
            Error::Generation { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, ProviderError::Timeout(90)));
            }
            other => panic!("Expected Generation, got: {other:?}"),
        }
        assert_eq!(*stub.calls.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn auxiliary_timeout_collapses_to_none_with_a_failed_metric() {
        let stub = StalledProvider::new();
        let registry = ProviderRegistry::new(AppConfig::default())
            .with_provider(ProviderRole::Speech, stub.clone());
        let orchestrator = AidOrchestrator::with_registry(registry);

        let text = orchestrator
            .generate_auxiliary_text("describe this", ProviderRole::Speech)
            .await
            .unwrap();
        assert!(text.is_none());
        assert_eq!(*stub.calls.lock().unwrap(), 1);

        let stats = orchestrator.performance_stats();
        assert_eq!(stats.failed_requests, 1);
        let last = orchestrator.metrics().snapshot().pop().unwrap();
        assert!(last.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_retry_budget_keeps_backoff_bounded() {
        let stub = StubProvider::new(VALID_REPLY, usize::MAX);
        let mut config = AppConfig::default();
        config.max_retries = 70;
        let registry =
            ProviderRegistry::new(config).with_provider(ProviderRole::Aid, stub.clone());
        let orchestrator = AidOrchestrator::with_registry(registry);

        let err = orchestrator.generate_aid("content").await.err().unwrap();
        assert!(matches!(err, Error::Generation { attempts: 70, .. }));
        assert_eq!(stub.calls(), 70);
    }
}

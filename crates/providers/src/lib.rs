//! LLM provider implementations for memoraid.
//!
//! All providers implement the `memoraid_core::AidProvider` trait. The
//! registry selects the correct provider from the deployment region and
//! explicit configuration, and caches one instance per role.

pub mod domestic;
pub mod international;
pub mod mock;
pub mod prompt;
pub mod registry;

pub use domestic::{QwenProvider, ZhipuProvider};
pub use international::{ClaudeProvider, GeminiProvider, OpenAiProvider};
pub use mock::MockProvider;
pub use registry::ProviderRegistry;

use memoraid_core::ProviderError;

/// Map a `reqwest` send failure to the provider error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// Reject non-success HTTP statuses, mapping auth failures separately.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();
    match status {
        200 => Ok(response),
        401 | 403 => Err(ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        )),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::ApiError {
                status_code: status,
                message: body,
            })
        }
    }
}

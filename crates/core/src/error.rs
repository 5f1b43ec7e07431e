//! Error types for the memoraid domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Provider transport
//! failures get their own enum so the orchestrator can retry them without
//! conflating them with caller mistakes or deployment defects.

use thiserror::Error;

/// The top-level error type for aid-generation operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied empty or invalid input. Rejected before any
    /// network interaction.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Missing or invalid credentials/configuration, raised at provider
    /// construction. Fatal — never retried.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A single provider call failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// All retry attempts were exhausted; wraps the last provider failure.
    #[error("Generation failed after {attempts} attempts: {source}")]
    Generation {
        attempts: u32,
        #[source]
        source: ProviderError,
    },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a single call to an upstream provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned no usable text")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the orchestrator should retry after this failure.
    ///
    /// Authentication and configuration failures are deterministic; retrying
    /// them only burns the attempt budget.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::AuthenticationFailed(_) | Self::NotConfigured(_)
        )
    }
}

//! Provider trait — the abstraction over LLM backends.
//!
//! A provider knows how to send a prompt to an upstream model and return
//! its raw textual reply. It deliberately does *not* parse that reply: the
//! repair pipeline owns all interpretation, so every backend (and the mock)
//! exercises the identical downstream path.

use crate::error::ProviderError;
use async_trait::async_trait;

/// Which cached provider instance a caller wants.
///
/// Structured-aid generation and auxiliary (speech/image prompt drafting)
/// generation may be served by different vendors; each role gets its own
/// lazily-built singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderRole {
    /// Structured memory aid generation.
    Aid,
    /// Auxiliary text generation for speech-related prompts.
    Speech,
}

impl std::fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aid => write!(f, "aid"),
            Self::Speech => write!(f, "speech"),
        }
    }
}

/// The core provider capability.
///
/// Every vendor backend implements this trait, plus a deterministic mock
/// for offline development. The orchestrator calls it without knowing which
/// backend is active.
#[async_trait]
pub trait AidProvider: Send + Sync {
    /// A human-readable name for this provider (e.g. "gemini", "qwen").
    fn name(&self) -> &str;

    /// Send the structured-aid prompt for `content` and return the model's
    /// raw reply verbatim, formatting noise included.
    ///
    /// Errors are reserved for transport/auth failures and timeouts;
    /// malformed text is not this layer's concern.
    async fn generate_structured_aid(&self, content: &str)
    -> Result<String, ProviderError>;

    /// Free-form text generation for auxiliary prompts.
    ///
    /// Returns `Ok(None)` when the upstream answered but produced no usable
    /// text; errors are reserved for true transport failures.
    async fn generate_text(&self, prompt: &str) -> Result<Option<String>, ProviderError>;
}
